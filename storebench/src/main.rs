fn main() -> anyhow::Result<()> {
    storebench::run()
}
