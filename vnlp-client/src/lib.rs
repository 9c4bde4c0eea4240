//! # vnlp-client: Cliente HTTP do vnlp-server
//!
//! Envolve o contrato HTTP do servidor (`GET /`, `GET /annotators`,
//! `POST /handle`) em chamadas tipadas. O envelope `{status, ...}` é
//! desembrulhado aqui: `status=false` vira [`ClientError::Server`].
//!
//! ## Exemplo de Uso
//!
//! ```no_run
//! use vnlp_client::{ClientConfig, VnlpClient};
//!
//! # async fn run() -> Result<(), vnlp_client::ClientError> {
//! let client = VnlpClient::new(ClientConfig::default())?;
//! if client.is_alive().await {
//!     for sentence in client.pos_tag("Tôi là sinh viên.").await? {
//!         println!("{sentence:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! O cliente não inicia o servidor: o processo `vnlp-server` é lançado à
//! parte, com o backend e os estágios desejados.

pub mod client;
pub mod error;

pub use client::{ClientConfig, Dependency, VnlpClient};
pub use error::ClientError;
