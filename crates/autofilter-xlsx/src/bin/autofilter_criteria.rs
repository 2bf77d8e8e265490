use anyhow::Result;

fn main() -> Result<()> {
    autofilter_xlsx::cli::run()
}
