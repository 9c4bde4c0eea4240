//! Configuração de linha de comando.

use std::path::PathBuf;

use clap::Parser;
use vnlp_core::{AnnotatorError, AnnotatorSet};

/// Servidor HTTP de anotação de vietnamita.
#[derive(Debug, Clone, Parser)]
#[command(name = "vnlp-server", version, about)]
pub struct Args {
    /// Artefato do backend: manifesto `.toml` ou plugin `.so`/`.dylib`/`.dll`
    pub backend: PathBuf,

    /// Endereço de escuta
    #[arg(short = 'i', long, env = "VNLP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "VNLP_PORT", default_value_t = 9000)]
    pub port: u16,

    /// Anotadores carregados no startup (`wseg,pos,ner,parse`)
    #[arg(
        short,
        long,
        env = "VNLP_ANNOTATORS",
        default_value = "wseg,pos,ner,parse",
        value_parser = parse_annotators
    )]
    pub annotators: AnnotatorSet,

    /// Logs em nível debug
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "vnlp_server=debug,vnlp_core=debug,tower_http=debug"
        } else {
            "vnlp_server=info,vnlp_core=info"
        }
    }
}

fn parse_annotators(list: &str) -> Result<AnnotatorSet, AnnotatorError> {
    AnnotatorSet::parse(list)
}
