pub fn run() -> anyhow::Result<()> {
    println!("tagwise {}", env!("CARGO_PKG_VERSION"));
    println!("Tag curation and AI request handling for todo lists");
    Ok(())
}
