use super::SlashCommand;

#[test]
fn it_parse_empty_string() {
    let text = "";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_space_only() {
    let text = " ";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_single_slash() {
    let text = "/";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_invalid_prefix() {
    let text = "!q";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_plain_question() {
    let text = "What is the invoice total?";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_valid_prefix() {
    let text = "/q";
    let cmd = SlashCommand::parse(text);
    assert!(cmd.is_some());
    assert_eq!(cmd.unwrap().command, "/q");
}

#[test]
fn it_is_short_quit() {
    let cmd = SlashCommand::parse("/q").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_quit() {
    let cmd = SlashCommand::parse("/quit").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_exit() {
    let cmd = SlashCommand::parse("/exit").unwrap();
    assert!(cmd.is_quit());
}

#[test]
fn it_is_voice_with_path() {
    let cmd = SlashCommand::parse("/voice ./recordings/my question.webm").unwrap();
    assert!(cmd.is_voice());
    assert_eq!(
        cmd.arg(),
        Some("./recordings/my question.webm".to_string())
    );
}

#[test]
fn it_is_upload_without_path() {
    let cmd = SlashCommand::parse("/upload").unwrap();
    assert!(cmd.is_upload());
    assert_eq!(cmd.arg(), None);
}

#[test]
fn it_is_documents() {
    assert!(SlashCommand::parse("/docs").unwrap().is_documents());
    assert!(SlashCommand::parse("/documents").unwrap().is_documents());
}

#[test]
fn it_is_delete() {
    let cmd = SlashCommand::parse("/delete 3f0c5a52").unwrap();
    assert!(cmd.is_delete());
    assert_eq!(cmd.arg(), Some("3f0c5a52".to_string()));
}

#[test]
fn it_is_debug() {
    assert!(SlashCommand::parse("/d").unwrap().is_debug());
    assert!(SlashCommand::parse("/debug").unwrap().is_debug());
}

#[test]
fn it_is_cancel() {
    assert!(SlashCommand::parse("/cancel").unwrap().is_cancel());
}

#[test]
fn it_is_help() {
    assert!(SlashCommand::parse("/h").unwrap().is_help());
    assert!(SlashCommand::parse("/help").unwrap().is_help());
}
