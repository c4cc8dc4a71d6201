use autodocs_core::WatchConfig;
use autodocs_watch::FlushOutcome;

/// One-shot flush. Exits non-zero when nothing could be delivered because
/// of an error; a clean tree is not an error.
pub fn execute(config: &WatchConfig) -> anyhow::Result<()> {
    match autodocs_watch::send_once(config)? {
        FlushOutcome::Delivered { status } => {
            println!("Sent to {} ({status})", config.webhook_url);
            Ok(())
        }
        FlushOutcome::NothingToReport => {
            println!("No changes to report");
            Ok(())
        }
        FlushOutcome::QueryFailed(e) => Err(anyhow::anyhow!("cannot read git state: {e}")),
        FlushOutcome::DeliveryFailed(e) => {
            Err(anyhow::anyhow!("delivery to {} failed: {e}", config.webhook_url))
        }
    }
}
