use autodocs_core::WatchConfig;

pub fn execute(config: WatchConfig) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(autodocs_watch::run(config))
}
