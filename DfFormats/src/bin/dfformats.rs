fn main() -> anyhow::Result<()> {
    dfformats::cli::run_cli()
}
