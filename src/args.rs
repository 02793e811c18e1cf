use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
pub struct Args {
    /// The address signups should listen on. By default
    /// signups will listen just on the IPv4 loopback.
    #[arg(short, long)]
    address: Option<String>,

    /// The port signups listens on.
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// JSON file holding the teacher accounts, read once at startup.
    /// If it can't be read, nobody can log in.
    #[arg(short, long, default_value = "teachers.json")]
    teachers: PathBuf,

    /// Directory served under /static (the landing page lives here).
    #[arg(long, default_value = "static")]
    static_dir: PathBuf,

    /// Reject signups once an activity reaches its max_participants.
    /// Off by default: capacity is advisory.
    #[arg(long)]
    enforce_capacity: bool,
}

impl Args {
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.address
            .as_deref()
            .unwrap_or("127.0.0.1")
            .parse()
            .map(|addr: IpAddr| (addr, self.port).into())
    }

    pub fn teachers(&self) -> &Path {
        &self.teachers
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    pub fn enforce_capacity(&self) -> bool {
        self.enforce_capacity
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["signups"]);

        assert_eq!(args.addr().unwrap(), "127.0.0.1:8000".parse().unwrap());
        assert_eq!(args.teachers(), Path::new("teachers.json"));
        assert_eq!(args.static_dir(), Path::new("static"));
        assert!(!args.enforce_capacity());
    }

    #[test]
    fn address_and_port() {
        let args = Args::parse_from(["signups", "-a", "::", "-p", "9000", "--enforce-capacity"]);

        assert_eq!(args.addr().unwrap(), "[::]:9000".parse().unwrap());
        assert!(args.enforce_capacity());
    }

    #[test]
    fn bad_address() {
        let args = Args::parse_from(["signups", "--address", "localhost"]);

        assert!(args.addr().is_err());
    }
}
