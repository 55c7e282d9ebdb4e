//! Listen-only mode: print every received message, translate nothing.

use std::sync::Arc;

use rosc::{OscMessage, OscType};

use crate::error::Result;
use crate::remote::osc_listener::{spawn_osc_listener, ListenerHandle};

fn format_arg(arg: &OscType) -> String {
    match arg {
        OscType::Int(v) => v.to_string(),
        OscType::Long(v) => v.to_string(),
        OscType::Float(v) => v.to_string(),
        OscType::Double(v) => v.to_string(),
        OscType::String(s) => format!("{:?}", s),
        OscType::Bool(b) => b.to_string(),
        other => format!("{:?}", other),
    }
}

/// `time: <unix millis>  msg: <address> <arg> <arg>...`
pub fn format_message(msg: &OscMessage, unix_millis: i64) -> String {
    let mut line = format!("time: {}  msg: {}", unix_millis, msg.addr);
    for arg in &msg.args {
        line.push(' ');
        line.push_str(&format_arg(arg));
    }
    line
}

pub fn spawn_monitor(bind_addr: &str, workers: usize) -> Result<ListenerHandle> {
    spawn_osc_listener(
        bind_addr,
        workers,
        Arc::new(|msg: &OscMessage| {
            println!("{}", format_message(msg, chrono::Utc::now().timestamp_millis()));
        }),
    )
}
