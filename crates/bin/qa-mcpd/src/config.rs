use clap::{Parser, builder::BoolishValueParser};
use std::net::SocketAddr;

const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4020";

#[derive(Parser, Debug)]
#[command(name = "qa-mcpd", version, about = "Answer-formatting MCP daemon.")]
struct CliArgs {
    /// Serve MCP over stdin/stdout instead of HTTP.
    #[arg(
        long = "stdio",
        env = "QA_MCP_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(long, env = "QA_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    http_addr: SocketAddr,
}

/// How the daemon exposes the formatting tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http(SocketAddr),
}

impl Transport {
    #[must_use]
    pub fn from_args() -> Self {
        Self::from(CliArgs::parse())
    }
}

impl From<CliArgs> for Transport {
    fn from(args: CliArgs) -> Self {
        if args.enable_stdio {
            Self::Stdio
        } else {
            Self::Http(args.http_addr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_http() {
        let args = CliArgs::try_parse_from(["qa-mcpd"]).expect("no flags should parse");

        assert_eq!(
            Transport::from(args),
            Transport::Http(DEFAULT_MCP_HTTP_ADDR.parse().expect("valid addr"))
        );
    }

    #[test]
    fn stdio_flag_wins_over_http_addr() {
        let args = CliArgs::try_parse_from(["qa-mcpd", "--stdio", "--http-addr", "0.0.0.0:9000"])
            .expect("flags should parse");

        assert_eq!(Transport::from(args), Transport::Stdio);
    }

    #[test]
    fn rejects_bad_address() {
        assert!(CliArgs::try_parse_from(["qa-mcpd", "--http-addr", "not-an-addr"]).is_err());
    }
}
