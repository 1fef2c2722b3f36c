mod common;

use common::mock_remote::{video_message, MockRemote};
use tgload_core::{Error, Session};

#[tokio::test]
async fn connect_logs_in_and_opens_the_chat() {
    let remote = MockRemote::new(vec![video_message(1, 11, 1000, "0")]);
    let session = Session::connect(remote.clone(), -100).await.unwrap();

    let methods: Vec<String> = remote.calls().into_iter().map(|(m, _)| m).collect();
    assert_eq!(methods, vec!["getAuthorizationState", "getChat"]);
    assert_eq!(remote.calls_to("getChat")[0]["chat_id"], -100);
    assert_eq!(session.catalog.chat_id(), -100);
    assert!(session.catalog.is_empty());

    // The dispatcher is already listening.
    session.catalog.fetch_page(10, None).await.unwrap();
    remote.push(11, 10, "/tmp/p");
    assert_eq!(session.catalog.get(11).unwrap().downloaded_size, 10);
}

#[tokio::test]
async fn unauthorized_session_is_fatal() {
    let remote = MockRemote::new(Vec::new());
    remote.set_auth_state("authorizationStateWaitPhoneNumber");

    let err = Session::connect(remote.clone(), -100).await.err().unwrap();
    assert!(matches!(err, Error::Auth(_)));
    assert!(err.is_fatal());
    assert!(remote.calls_to("getChat").is_empty());
}

#[tokio::test]
async fn failed_login_call_is_an_auth_error() {
    let remote = MockRemote::new(Vec::new());
    remote.fail("getAuthorizationState");

    let err = Session::connect(remote, -100).await.err().unwrap();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn unreachable_chat_is_a_remote_error() {
    let remote = MockRemote::new(Vec::new());
    remote.fail("getChat");

    let err = Session::connect(remote, -100).await.err().unwrap();
    assert!(matches!(err, Error::Remote(ref e) if e.method == "getChat"));
    assert!(!err.is_fatal());
}
