use std::sync::Arc;

use anyhow::Context;
use bookclub_app::build_dispatcher;
use bookclub_app::provider::OpenLibraryClient;
use bookclub_db::SnapshotFile;
use bookclub_gateway::{GatewaySession, LineSource};
use bookclub_http::{AppState, SignatureVerifier};
use bookclub_kernel::settings::Settings;
use bookclub_kernel::ClubStore;
use bookclub_platform::RestClient;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookclub settings")?;
    bookclub_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        state = %settings.storage.state_path.display(),
        "bookclub bootstrap starting"
    );

    let snapshots = Arc::new(SnapshotFile::new(&settings.storage.state_path));
    let store = ClubStore::new(snapshots.load().await);
    let lookup = Arc::new(
        OpenLibraryClient::new(&settings.lookup).context("failed to build metadata provider")?,
    );
    let dispatcher = Arc::new(build_dispatcher(store, lookup, snapshots)?);
    let api = Arc::new(
        RestClient::new(&settings.platform).context("failed to build platform client")?,
    );

    tracing::info!(
        commands = dispatcher.registry().command_count(),
        actions = dispatcher.registry().action_count(),
        "handlers registered"
    );

    if settings.gateway.enabled {
        let session = GatewaySession::new(dispatcher.clone(), api.clone());
        tokio::spawn(async move {
            let source = LineSource::new(BufReader::new(tokio::io::stdin()));
            if let Err(err) = session.run(source).await {
                tracing::error!(error = ?err, "gateway session failed");
            }
        });
    }

    let verifier = SignatureVerifier::from_hex(&settings.platform.public_key)
        .context("platform.public_key is required to verify interaction callbacks")?;
    let state = AppState {
        dispatcher,
        api,
        verifier: Some(Arc::new(verifier)),
    };
    bookclub_http::start_server(state, &settings.server).await
}
