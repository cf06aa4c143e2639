//! Port selection from argv.
use hostdash_agent::config::{parse_port, DEFAULT_PORT};

fn args(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn port_long_short_and_assign() {
    assert_eq!(parse_port(args(&["agent", "--port", "9001"]), DEFAULT_PORT), 9001);
    assert_eq!(parse_port(args(&["agent", "-p", "9002"]), DEFAULT_PORT), 9002);
    assert_eq!(parse_port(args(&["agent", "--port=9003"]), DEFAULT_PORT), 9003);
    assert_eq!(parse_port(args(&["agent"]), DEFAULT_PORT), DEFAULT_PORT);
}

#[test]
fn long_form_wins_over_short() {
    assert_eq!(
        parse_port(args(&["agent", "-p", "7000", "--port", "7001"]), DEFAULT_PORT),
        7001
    );
}
