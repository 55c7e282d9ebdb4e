use std::thread;
use std::time::Duration;

use osc2midi::remote::osc_sender::send_command;

/// Plays a short C major arpeggio through a running bridge.
///
/// Start the bridge first, e.g. `osc2midi serve 9000 "IAC Driver Bus 1"`,
/// then `cargo run --example send_midi_notes -- 9000`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::args().nth(1).unwrap_or_else(|| "9000".to_string());
    let target_addr = format!("127.0.0.1:{}", port);
    println!("Sending /midi notes to {}", target_addr);

    for note in ["60", "64", "67", "72"] {
        send_command(&target_addr, "/midi", &["144", note, "100"])?;
        println!("Note on {}", note);
        thread::sleep(Duration::from_millis(300));
        send_command(&target_addr, "/midi", &["128", note, "0"])?;
    }

    // control change 123: all notes off on channel 1
    send_command(&target_addr, "/midi", &["176", "123", "0"])?;
    println!("Done");
    Ok(())
}
