use thiserror::Error;

/// Falhas de uma chamada ao servidor.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Conexão, timeout, status HTTP de erro ou JSON ilegível.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// O servidor respondeu com `status=false`; a mensagem é a do envelope.
    #[error("server error: {0}")]
    Server(String),

    /// Envelope válido, mas sem o conteúdo que a chamada pediu.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}
