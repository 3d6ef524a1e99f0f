pub mod coding;
pub mod codec;
pub mod connector;
pub mod datatypes;
pub mod manager;
pub mod session;

#[cfg(test)]
mod tests;

// Re-export codec types for direct access
pub use codec::{CodecError, Decodable, Encodable, Frame, PduHeader, PduRegistry};

pub use coding::{Coding, CodingError, CodingRegistry};
pub use manager::{Manager, ManagerConfig, ManagerError};
pub use session::{Session, SessionConfig, SessionError};

/// Error returned by most functions.
///
/// When writing a real application, one might want to consider a specialized
/// error handling crate or defining an error type as an `enum` of causes.
/// However, for our example, using a boxed `std::error::Error` is sufficient.
///
/// For performance reasons, boxing is avoided in any hot path. Individual
/// components define their own `thiserror` error enums (see [`CodecError`],
/// [`session::SessionError`], [`manager::ManagerError`]) which convert into
/// this type at the API boundary.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for SMPP operations.
///
/// This is defined as a convenience.
///
/// # Examples
///
/// ## Basic SMS Sending
///
/// This example shows the simplest way to send an SMS message through a pooled
/// manager of sessions:
///
/// ```rust,no_run
/// use smpp::manager::{Manager, ManagerConfig, Message};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ManagerConfig {
///         url: "localhost:2775".to_string(),
///         system_id: "system_id".to_string(),
///         password: "password".to_string(),
///         max_connection: 2,
///         ..ManagerConfig::default()
///     };
///     let manager = Manager::new(config);
///     manager.start().await?;
///
///     let message = Message {
///         from: "+15551234567".to_string(),
///         to: "+15557654321".to_string(),
///         text: "Hello, World!".to_string(),
///     };
///     let outcomes = manager.send(message, &[]).await?;
///     println!("submitted {} segment(s)", outcomes.len());
///
///     manager.close(&[]).await?;
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
