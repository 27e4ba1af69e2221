use miette::Result;

pub fn run() -> Result<()> {
    println!("esparse {}", esparse::version());
    Ok(())
}
