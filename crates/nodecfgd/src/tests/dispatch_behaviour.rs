//! Behavioural tests for request routing against a fixed registry.

use rstest::{fixture, rstest};

use crate::dispatch::{CfgRequest, CfgResponse, RequestRouter};
use crate::providers::{ConfigProvider, ProviderError};
use crate::registry::{ProviderRegistry, RegistryHandle};
use crate::tests::support::{MockProvider, fixed_registry};

fn line(part: &str, node_id: i32) -> Vec<u8> {
    CfgRequest::new(part, node_id)
        .to_line()
        .expect("request should encode")
}

#[fixture]
fn router() -> RequestRouter {
    RequestRouter::new(RegistryHandle::new(fixed_registry(&[
        ("signalling", "signalling-config"),
        ("lnp", "lnp-config"),
    ])))
}

#[rstest]
fn lookup_reaches_only_the_named_provider() {
    let mut signalling = MockProvider::new();
    signalling.expect_serialize().never();
    let mut lnp = MockProvider::new();
    lnp.expect_serialize()
        .withf(|node_id| *node_id == 7)
        .times(1)
        .returning(|_| Ok(b"lnp-blob".to_vec()));
    let providers: [(&str, Box<dyn ConfigProvider>); 2] =
        [("signalling", Box::new(signalling)), ("lnp", Box::new(lnp))];
    let registry = ProviderRegistry::from_providers(providers).expect("registry");
    let router = RequestRouter::new(RegistryHandle::new(registry));

    assert_eq!(
        router.reply_for(&line("lnp", 7)),
        CfgResponse::values(b"lnp-blob".to_vec())
    );
    assert_eq!(
        router.reply_for(&line("billing", 1)),
        CfgResponse::error(404, "unknown cfg part")
    );
}

#[rstest]
fn legacy_alias_reaches_the_signalling_provider(router: RequestRouter) {
    let via_alias = router.handle(&line("sig_yeti", 3));
    let direct = router.handle(&line("signalling", 3));

    assert_eq!(via_alias, direct);
    assert_eq!(
        CfgResponse::parse(&via_alias).expect("decode reply"),
        CfgResponse::values(b"signalling-config".to_vec())
    );
}

#[rstest]
#[case::unknown_part(line("billing", 1), b"{\"error\":{\"code\":404,\"reason\":\"unknown cfg part\"}}\n".as_slice())]
#[case::garbage(b"\x89PNG\r\n".to_vec(), b"{\"error\":{\"code\":500,\"reason\":\"can't decode request\"}}\n".as_slice())]
#[case::empty(b"\n".to_vec(), b"{\"error\":{\"code\":500,\"reason\":\"can't decode request\"}}\n".as_slice())]
#[case::wrong_shape(b"{\"part\":\"lnp\"}\n".to_vec(), b"{\"error\":{\"code\":500,\"reason\":\"can't decode request\"}}\n".as_slice())]
fn fixed_errors_are_byte_exact(
    router: RequestRouter,
    #[case] request: Vec<u8>,
    #[case] expected: &[u8],
) {
    assert_eq!(router.handle(&request), expected);
}

#[rstest]
fn provider_failures_keep_their_code_and_message() {
    let mut provider = MockProvider::new();
    provider
        .expect_serialize()
        .returning(|node_id| Err(ProviderError::new(503, format!("node {node_id} offline"))));
    let provider: Box<dyn ConfigProvider> = Box::new(provider);
    let registry = ProviderRegistry::from_providers([("lnp", provider)]).expect("registry");
    let router = RequestRouter::new(RegistryHandle::new(registry));

    assert_eq!(
        router.reply_for(&line("lnp", 9)),
        CfgResponse::error(503, "node 9 offline")
    );
}

#[rstest]
fn identical_requests_get_identical_replies(router: RequestRouter) {
    let request = line("lnp", 12);

    let first = router.handle(&request);
    let second = router.handle(&request);

    assert_eq!(first, second);
}

#[rstest]
fn part_names_are_case_sensitive(router: RequestRouter) {
    assert_eq!(
        router.reply_for(&line("LNP", 1)),
        CfgResponse::error(404, "unknown cfg part")
    );
}
