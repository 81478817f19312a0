use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::client::{EntrySubmission, PlaySubmission, RemoteSubmitter, WheelParticipation};
use super::credentials::CredentialBroker;
use super::RemoteError;

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Entry(EntrySubmission),
    Play(PlaySubmission),
    Wheel(WheelParticipation),
}

impl Submission {
    pub fn kind(&self) -> &'static str {
        match self {
            Submission::Entry(_) => "entry",
            Submission::Play(_) => "play",
            Submission::Wheel(_) => "wheel",
        }
    }

    pub fn uid(&self) -> &str {
        match self {
            Submission::Entry(entry) => &entry.uid,
            Submission::Play(play) => &play.uid,
            Submission::Wheel(participation) => &participation.uid,
        }
    }
}

/// Sends submissions to the remote mirror in the background.
///
/// Local state is already saved by the time a submission is dispatched, so
/// failures are only logged. A duplicate registration counts as delivered.
#[derive(Clone)]
pub struct SubmissionDispatcher {
    remote: Arc<dyn RemoteSubmitter>,
    broker: Arc<CredentialBroker>,
}

impl SubmissionDispatcher {
    pub fn new(remote: Arc<dyn RemoteSubmitter>, broker: Arc<CredentialBroker>) -> Self {
        Self { remote, broker }
    }

    pub fn dispatch(&self, submission: Submission) -> JoinHandle<Result<(), RemoteError>> {
        let remote = Arc::clone(&self.remote);
        let broker = Arc::clone(&self.broker);

        tokio::spawn(async move {
            let kind = submission.kind();
            match deliver(remote.as_ref(), &broker, &submission).await {
                Ok(()) => {
                    debug!(kind, uid = %submission.uid(), "Submission delivered");
                    Ok(())
                }
                Err(e) if e.is_already_registered() => {
                    debug!(kind, uid = %submission.uid(), "Entry already registered");
                    Ok(())
                }
                Err(e) => {
                    warn!(kind, uid = %submission.uid(), error = %e, "Submission failed");
                    if e.invalidates_credentials() {
                        broker.invalidate().await;
                    }
                    Err(e)
                }
            }
        })
    }
}

async fn deliver(
    remote: &dyn RemoteSubmitter,
    broker: &CredentialBroker,
    submission: &Submission,
) -> Result<(), RemoteError> {
    let credentials = broker.acquire().await?;
    match submission {
        Submission::Entry(entry) => remote.create_entry(entry, &credentials).await,
        Submission::Play(play) => remote.submit_play(play, &credentials).await,
        Submission::Wheel(participation) => {
            remote
                .submit_wheel_participation(participation, &credentials)
                .await
        }
    }
}
