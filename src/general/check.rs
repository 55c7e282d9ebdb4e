use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static BANNER_PRINTED: AtomicBool = AtomicBool::new(false);

fn print_banner_once(color: Color, text: &str) -> bool {
    // Ensure we only print one banner overall
    if BANNER_PRINTED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return false;
    }
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_intense(true));
    let _ = writeln!(&mut stdout, "{}", text);
    let _ = stdout.reset();
    true
}

pub fn print_bridge_active(listen_addr: &str, output_name: &str) -> bool {
    print_banner_once(
        Color::Green,
        &format!("Bridge active | OSC {} -> MIDI '{}'", listen_addr, output_name),
    )
}

pub fn print_bridge_failed(reason: &str) -> bool {
    print_banner_once(Color::Red, &format!("Bridge not started | {}", reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_printed_once() {
        assert!(print_bridge_active("127.0.0.1:9000", "Synth"));
        assert!(!print_bridge_failed("later"));
        assert!(!print_bridge_active("127.0.0.1:9000", "Synth"));
    }
}
