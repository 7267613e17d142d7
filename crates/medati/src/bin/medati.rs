fn main() -> anyhow::Result<()> {
    medati::cli::run()
}
