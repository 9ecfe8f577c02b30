fn main() -> anyhow::Result<()> {
    roster_tui::cli::run()
}
