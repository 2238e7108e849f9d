fn main() -> anyhow::Result<()> {
    seascape::run()
}
