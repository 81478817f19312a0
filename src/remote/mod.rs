pub mod client;
pub mod credentials;
pub mod dispatcher;
pub mod http;

mod errors;

pub use client::{
    Credentials, EntrySubmission, InMemoryRemote, LoggingRemote, PlaySubmission, RemoteSubmitter,
    WheelParticipation,
};
pub use credentials::{
    token_expiry, ChallengeSource, CredentialBroker, SessionTokenSource, StaticToken,
};
pub use dispatcher::{Submission, SubmissionDispatcher};
pub use http::HttpRemote;
pub use errors::RemoteError;
