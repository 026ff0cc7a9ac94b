pub mod analyzer;
pub mod config;
pub mod credentials;
pub mod intake;
pub mod session;

pub use analyzer::{build_analyzer, DryrunAnalyzer, GeminiAnalyzer, ImageAnalyzer};
pub use config::{AnalyzerConfig, DRYRUN_MODEL};
pub use credentials::{CredentialGate, CredentialHost, KeySelector, SessionKeyHost};
pub use intake::{read_image_file, UploadPolicy, UploadRejection};
pub use session::{AnalysisOutcome, AnalysisSession, AnalysisTicket, SessionError};
