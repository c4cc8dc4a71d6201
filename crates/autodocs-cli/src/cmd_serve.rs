use autodocs_core::ServeConfig;

pub fn execute(config: ServeConfig) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(autodocs_serve::serve(config))
}
