use std::io::{self, Write};
use tracing::debug;

pub const HELP_BANNER: &str = "
Train Controls:
--------------
W: Increase speed
S: Decrease speed
Space: Stop
R: Reverse direction
Q: Quit
";

pub fn print_banner() {
    println!("{}", HELP_BANNER);
}

pub fn speed_line(speed: i32) -> String {
    format!("\rSpeed: {}%   ", speed)
}

pub fn write_speed<W: Write>(out: &mut W, speed: i32) -> io::Result<()> {
    write!(out, "{}", speed_line(speed))?;
    out.flush()
}

/// Overwrite the status line in place
pub fn show_speed(speed: i32) {
    if let Err(e) = write_speed(&mut io::stdout(), speed) {
        debug!("Failed to print speed: {}", e);
    }
}

pub fn print_disconnected() {
    println!("\nDisconnected from train.");
}

pub fn print_exiting() {
    println!("\nExiting...");
}
