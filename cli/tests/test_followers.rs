use crate::{test_common_followers::mock_follower_ids, TestCli};
use mockito::Matcher;
use pretty_assertions::assert_eq;

#[test]
fn test_followers_screen_names_in_listing_order() {
    let cli = TestCli::get();
    let config_file = TestCli::config_file();
    let mut server = mockito::Server::new();
    let first = server
        .mock("GET", "/followers/list.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("screen_name".into(), "jack".into()),
            Matcher::UrlEncoded("cursor".into(), "-1".into()),
        ]))
        .with_body(
            r#"{"users": [{"id": 5, "screen_name": "carol"}, {"id": 1, "screen_name": "alice"}],
                "next_cursor_str": "42"}"#,
        )
        .expect(1)
        .create();
    let second = server
        .mock("GET", "/followers/list.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("screen_name".into(), "jack".into()),
            Matcher::UrlEncoded("cursor".into(), "42".into()),
        ]))
        .with_body(r#"{"users": [{"id": 8, "screen_name": "dave"}], "next_cursor_str": "0"}"#)
        .expect(1)
        .create();

    let run = cli.run_ok(&server.url(), &config_file, ["followers", "jack"]);

    assert_eq!(run.stdout, "carol\nalice\ndave\n");
    first.assert();
    second.assert();
}

#[test]
fn test_follower_ids() {
    let cli = TestCli::get();
    let config_file = TestCli::config_file();
    let mut server = mockito::Server::new();
    let _page = mock_follower_ids(&mut server, "jack", "-1", &[9, 4, 7], "0");

    let run = cli.run_ok(&server.url(), &config_file, ["followers", "jack", "--ids"]);
    assert_eq!(run.stdout, "9\n4\n7\n");
}

#[test]
fn test_user_id_table() {
    let cli = TestCli::get();
    let config_file = TestCli::config_file();
    let mut server = mockito::Server::new();
    let _lookup = server
        .mock("GET", "/users/lookup.json")
        .match_query(Matcher::UrlEncoded("screen_name".into(), "jack".into()))
        .with_body(r#"[{"id": 12}]"#)
        .create();

    let run = cli.run_ok(&server.url(), &config_file, ["user-id", "@jack"]);

    let row = run
        .stdout
        .lines()
        .find(|line| line.contains("jack"))
        .expect("no row for jack");
    assert_eq!(row.split_whitespace().collect::<Vec<_>>(), vec!["jack", "12"]);
}
