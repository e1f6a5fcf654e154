//! Argument definitions for the hyperd daemon binary.

use clap::Parser;
use hyperd_server::{UserCredential, DEFAULT_PORT};

use crate::styles;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Arguments for the hyperd command
#[derive(Debug, Parser)]
#[command(name = "hyperd", author, styles=styles::styles())]
pub struct HyperdArgs {
    /// Port number to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// User allowed to open API sessions, as username:password; repeatable
    #[arg(short = 'u', long = "allow-user", value_name = "USER:PASSWORD")]
    pub users: Vec<UserCredential>,

    /// Name label advertised for this host
    #[arg(long = "host-name", default_value = "localhost")]
    pub host_name: String,

    /// Description advertised for this host
    #[arg(long = "host-description", default_value = "")]
    pub host_description: String,

    /// Run in development mode
    #[arg(long = "dev", default_value_t = false)]
    pub dev_mode: bool,
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
