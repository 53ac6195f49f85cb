// tests/integration/onion_roundtrip.rs
use std::sync::Arc;

use onion_relay::crypto::{generate_asymmetric_key_pair, CryptoError, KeyPair};
use onion_relay::onion::ADDRESS_WIDTH;
use onion_relay::{
    build_onion, peel_layer, Address, AddressPlan, Circuit, DirectoryEntry, DirectorySource,
    LocalNetwork, OnionError, Registry, Relay, RelayState, SendError, TransportError, User,
};
use proptest::prelude::*;

const PLAN: AddressPlan = AddressPlan {
    relay_base: 4000,
    user_base: 3000,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn key_pairs(n: usize) -> Vec<KeyPair> {
    (0..n).map(|_| generate_asymmetric_key_pair().unwrap()).collect()
}

fn circuit_for(pairs: &[KeyPair]) -> Circuit {
    Circuit {
        hops: pairs
            .iter()
            .enumerate()
            .map(|(i, p)| DirectoryEntry::new(i as u32, &p.public_key))
            .collect(),
    }
}

/// A registry, its relays and its users wired into one in-process network.
struct TestNet {
    network: Arc<LocalNetwork>,
    registry: Arc<Registry>,
    relays: Vec<Arc<Relay>>,
    users: Vec<Arc<User>>,
}

async fn local_network(relays: u32, users: u32, circuit_length: usize) -> TestNet {
    let network = Arc::new(LocalNetwork::new());
    let registry = Arc::new(Registry::new());

    let mut relay_nodes = Vec::new();
    for node_id in 0..relays {
        let relay = Arc::new(Relay::new(node_id, PLAN.relay(node_id).unwrap()).unwrap());
        registry.register(relay.directory_entry()).await.unwrap();
        network.attach(relay.address(), relay.clone()).await;
        relay_nodes.push(relay);
    }

    let mut user_nodes = Vec::new();
    for user_id in 0..users {
        let user = Arc::new(User::new(user_id, PLAN, circuit_length).unwrap());
        network.attach(user.address(), user.clone()).await;
        user_nodes.push(user);
    }

    TestNet {
        network,
        registry,
        relays: relay_nodes,
        users: user_nodes,
    }
}

#[test]
fn test_three_hop_chain_reveals_one_address_per_hop() {
    let pairs = key_pairs(3);
    let circuit = circuit_for(&pairs);
    let onion = build_onion("hello", &circuit, Address(5000), &PLAN).unwrap();

    let at_a = peel_layer(&onion, &pairs[0].private_key).unwrap();
    assert_eq!(&at_a.decrypted()[..ADDRESS_WIDTH], "0000004001");
    assert_eq!(at_a.next_hop, Address(4001));

    let at_b = peel_layer(at_a.payload(), &pairs[1].private_key).unwrap();
    assert_eq!(&at_b.decrypted()[..ADDRESS_WIDTH], "0000004002");
    assert_eq!(at_b.next_hop, Address(4002));

    let at_c = peel_layer(at_b.payload(), &pairs[2].private_key).unwrap();
    assert_eq!(&at_c.decrypted()[..ADDRESS_WIDTH], "0000005000");
    assert_eq!(at_c.next_hop, Address(5000));
    assert_eq!(at_c.payload(), "hello");
}

#[test]
fn test_layers_must_be_peeled_in_order() {
    let pairs = key_pairs(3);
    let onion = build_onion("hello", &circuit_for(&pairs), Address(5000), &PLAN).unwrap();
    for pair in &pairs[1..] {
        assert_eq!(
            peel_layer(&onion, &pair.private_key).unwrap_err(),
            OnionError::Crypto(CryptoError::DecryptionFailed)
        );
    }
}

#[test]
fn test_wire_shape_of_outer_layer() {
    let pairs = key_pairs(2);
    let onion = build_onion("hello", &circuit_for(&pairs), Address(3001), &PLAN).unwrap();
    let (key, body) = onion.split_once('.').unwrap();
    assert!(!key.contains(':'));
    let (iv, ciphertext) = body.split_once(':').unwrap();
    assert_eq!(iv.len(), 24);
    assert!(!ciphertext.is_empty());
}

#[test]
fn test_same_message_and_circuit_never_repeat() {
    let pairs = key_pairs(3);
    let circuit = circuit_for(&pairs);
    let a = build_onion("hello", &circuit, Address(3001), &PLAN).unwrap();
    let b = build_onion("hello", &circuit, Address(3001), &PLAN).unwrap();
    assert_ne!(a, b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_peeling_every_layer_restores_message(
        message in any::<String>(),
        hops in 1usize..5,
        destination in 0u64..=9_999_999_999,
    ) {
        let pairs = key_pairs(hops);
        let circuit = circuit_for(&pairs);
        let mut payload = build_onion(&message, &circuit, Address(destination), &PLAN).unwrap();

        for (i, pair) in pairs.iter().enumerate() {
            let layer = peel_layer(&payload, &pair.private_key).unwrap();
            let expected = if i + 1 == hops {
                Address(destination)
            } else {
                PLAN.relay(i as u32 + 1).unwrap()
            };
            prop_assert_eq!(layer.next_hop, expected);
            payload = layer.into_payload();
        }
        prop_assert_eq!(payload, message);
    }
}

#[tokio::test]
async fn test_message_crosses_local_network() {
    init_logging();
    let TestNet { network, registry, relays, users } = local_network(5, 2, 3).await;

    users[0]
        .send_message("Test message", 1, registry.as_ref(), network.as_ref())
        .await
        .unwrap();

    assert_eq!(users[1].last_received_message().await.as_deref(), Some("Test message"));
    assert_eq!(users[0].last_sent_message().await.as_deref(), Some("Test message"));

    let used: Vec<&Arc<Relay>> = {
        let mut used = Vec::new();
        for relay in &relays {
            if relay.diagnostics().await.last_outcome == Some(RelayState::Forwarded) {
                used.push(relay);
            }
        }
        used
    };
    assert_eq!(used.len(), 3);

    let exits: Vec<_> = {
        let mut exits = Vec::new();
        for relay in &used {
            if relay.last_destination().await == Some(users[1].address()) {
                exits.push(relay.node_id());
            }
        }
        exits
    };
    assert_eq!(exits.len(), 1);
    assert!(relays.iter().all(|r| r.state() == RelayState::Idle));
}

#[tokio::test]
async fn test_single_hop_network() {
    let TestNet { network, registry, users, .. } = local_network(1, 2, 1).await;
    users[1]
        .send_message("back", 0, registry.as_ref(), network.as_ref())
        .await
        .unwrap();
    assert_eq!(users[0].last_received_message().await.as_deref(), Some("back"));
}

#[tokio::test]
async fn test_missing_relay_terminates_the_chain() {
    init_logging();
    let TestNet { network, registry, relays, users } = local_network(3, 2, 3).await;
    network.detach(relays[1].address()).await;

    // With every relay in every circuit, relay 1 is always on the path.
    let err = users[0]
        .send_message("lost", 1, registry.as_ref(), network.as_ref())
        .await
        .unwrap_err();

    match err {
        SendError::ForwardFailed(TransportError::Rejected { .. })
        | SendError::ForwardFailed(TransportError::Unreachable(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(users[1].last_received_message().await, None);
}

#[tokio::test]
async fn test_too_few_relays_fails_fast() {
    let TestNet { network, registry, relays, users } = local_network(2, 2, 3).await;
    let err = users[0]
        .send_message("nope", 1, registry.as_ref(), network.as_ref())
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::Circuit(_)));
    for relay in &relays {
        assert_eq!(relay.last_received_encrypted().await, None);
    }
}

#[tokio::test]
async fn test_concurrent_senders() {
    let TestNet { network, registry, relays, users } = local_network(4, 3, 3).await;

    let mut handles = Vec::new();
    for i in 0..16u32 {
        let network = network.clone();
        let registry = registry.clone();
        let sender = users[(i % 2) as usize].clone();
        handles.push(tokio::spawn(async move {
            sender
                .send_message(&format!("msg {}", i), 2, registry.as_ref(), network.as_ref())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let received = users[2].last_received_message().await.unwrap();
    assert!(received.starts_with("msg "));
    let forwarded: u64 = relays
        .iter()
        .map(|r| r.metrics().messages_forwarded.load(std::sync::atomic::Ordering::Relaxed))
        .sum();
    assert_eq!(forwarded, 16 * 3);
    assert_eq!(registry.list_entries().await.unwrap().len(), 4);
}
