//! Tests for query options and argument building.

use std::time::Duration;

use claude_query::cli::{
    LaunchSpec, Options, PermissionMode, QueryRequest, DEFAULT_CHANNEL_BUFFER,
    DEFAULT_MAX_RECORD_BYTES, DEFAULT_MAX_STDERR_BYTES,
};

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[test]
fn default_args_request_stream_json() {
    let args = Options::new().build_args("Fix the bug");

    assert_eq!(
        &args[..4],
        &["--print", "--output-format", "stream-json", "--verbose"]
    );
    assert_eq!(args.last().map(String::as_str), Some("Fix the bug"));
    assert_eq!(args.len(), 5);
}

#[test]
fn allowed_and_disallowed_tools() {
    let args = Options::new()
        .allowed_tools(&["Read", "Write", "Bash"])
        .disallowed_tools(&["WebFetch"])
        .build_args("task");

    assert_eq!(flag_value(&args, "--allowedTools"), Some("Read,Write,Bash"));
    assert_eq!(flag_value(&args, "--disallowedTools"), Some("WebFetch"));
}

#[test]
fn model_turns_and_prompts() {
    let args = Options::new()
        .model("sonnet")
        .max_turns(5)
        .system_prompt("Custom system prompt")
        .append_system_prompt("Extra context here")
        .build_args("task");

    assert_eq!(flag_value(&args, "--model"), Some("sonnet"));
    assert_eq!(flag_value(&args, "--max-turns"), Some("5"));
    assert_eq!(
        flag_value(&args, "--system-prompt"),
        Some("Custom system prompt")
    );
    assert_eq!(
        flag_value(&args, "--append-system-prompt"),
        Some("Extra context here")
    );
}

#[test]
fn mcp_config_and_permission_mode() {
    let args = Options::new()
        .mcp_config("/etc/mcp.json")
        .permission_mode(PermissionMode::AcceptEdits)
        .build_args("task");

    assert_eq!(flag_value(&args, "--mcp-config"), Some("/etc/mcp.json"));
    assert_eq!(flag_value(&args, "--permission-mode"), Some("acceptEdits"));
}

#[test]
fn resume_takes_precedence_over_continue() {
    let args = Options::new()
        .continue_conversation()
        .resume("session_abc123")
        .build_args("continue");

    assert_eq!(flag_value(&args, "--resume"), Some("session_abc123"));
    assert!(!args.contains(&"--continue".to_string()));

    let args = Options::new().continue_conversation().build_args("again");
    assert!(args.contains(&"--continue".to_string()));
}

#[test]
fn prompt_is_always_last() {
    let args = Options::new()
        .model("opus")
        .resume("s1")
        .build_args("--looks-like-a-flag");

    assert_eq!(args.last().map(String::as_str), Some("--looks-like-a-flag"));
}

#[test]
fn defaults_and_limits() {
    let options = Options::new();
    assert_eq!(options.channel_buffer, DEFAULT_CHANNEL_BUFFER);
    assert_eq!(options.max_stderr_bytes, DEFAULT_MAX_STDERR_BYTES);
    assert_eq!(options.max_record_bytes, DEFAULT_MAX_RECORD_BYTES);
    assert!(options.cli_path.is_none());

    let options = Options::new()
        .channel_buffer(0)
        .max_stderr_bytes(10)
        .terminate_timeout(Duration::from_millis(50))
        .stderr_grace(Duration::from_millis(20));
    assert_eq!(options.channel_buffer, 1);
    assert_eq!(options.max_stderr_bytes, 10);
    assert_eq!(options.terminate_timeout, Duration::from_millis(50));
    assert_eq!(options.stderr_grace, Duration::from_millis(20));
}

#[test]
fn launch_spec_carries_options() {
    let options = Options::new()
        .cli_path("/opt/claude")
        .working_dir("/tmp/project")
        .env("ANTHROPIC_LOG", "debug")
        .input("payload");
    let spec = LaunchSpec::from_options("hello", &options);

    assert_eq!(spec.binary.as_deref(), Some(std::path::Path::new("/opt/claude")));
    assert_eq!(spec.working_dir.as_deref(), Some(std::path::Path::new("/tmp/project")));
    assert_eq!(spec.env.get("ANTHROPIC_LOG").map(String::as_str), Some("debug"));
    assert_eq!(spec.stdin.as_deref(), Some(b"payload".as_slice()));
    assert_eq!(spec.args, options.build_args("hello"));
}

#[test]
fn launch_spec_without_input_has_no_stdin() {
    let spec = LaunchSpec::from_options("hello", &Options::new());
    assert!(spec.stdin.is_none());
    assert!(spec.binary.is_none());
}

#[test]
fn query_request_new() {
    let request = QueryRequest::new("prompt", Options::new().max_turns(2));
    assert_eq!(request.prompt, "prompt");
    assert_eq!(request.options.max_turns, Some(2));
}

#[test]
fn permission_mode_serde_matches_flag() {
    let mode: PermissionMode = serde_json::from_str("\"bypassPermissions\"").unwrap();
    assert_eq!(mode, PermissionMode::BypassPermissions);
    assert_eq!(mode.as_str(), "bypassPermissions");
}
