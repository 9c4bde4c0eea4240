//! Superfície HTTP do vnlp: argumentos de linha de comando e rotas axum.
//!
//! Exposta como biblioteca para que clientes e testes montem o mesmo
//! `Router` que o binário serve.

pub mod config;
pub mod routes;
