use ndarray::{arr1, arr2, Array1, Array2};
use crate::agent::{argmax, AgentSnapshot, DqnAgent, DqnAgentBuilder, DqnConfig};
use crate::error::ReasonerError;
use crate::layers::{DenseLayer, LayerParts};
use crate::network::{NetworkParts, QNetwork};
use crate::replay_buffer::Transition;
use super::seeded_rng;

fn small_config() -> DqnConfig {
    DqnConfig {
        state_size: 16,
        action_size: 4,
        seed: Some(11),
        ..DqnConfig::default()
    }
}

fn fill_buffer(agent: &mut DqnAgent, count: usize) {
    let state_size = agent.config().state_size;
    let action_size = agent.config().action_size;
    for i in 0..count {
        agent
            .remember(Transition {
                state: Array1::from_elem(state_size, (i % 10) as f32 / 10.0),
                action: i % action_size,
                reward: 1.0,
                next_state: Array1::from_elem(state_size, 0.5),
                done: i % 7 == 0,
            })
            .unwrap();
    }
}

#[test]
fn test_default_configuration() {
    let agent = DqnAgentBuilder::new().seed(1).build().unwrap();
    let config = agent.config();

    assert_eq!(config.state_size, 128);
    assert_eq!(config.action_size, 64);
    assert_eq!(config.gamma, 0.99);
    assert_eq!(config.min_epsilon, 0.01);
    assert_eq!(config.epsilon_decay, 0.995);
    assert_eq!(config.target_update_freq, 100);
    assert_eq!(agent.epsilon(), 1.0);
    assert_eq!(agent.total_steps(), 0);
    assert_eq!(agent.buffer().capacity(), 10_000);
    assert_eq!(agent.q_network().layers().len(), 3);
}

#[test]
fn test_dqn_builder() {
    let agent = DqnAgentBuilder::new()
        .state_size(8)
        .action_size(3)
        .epsilon(0.3)
        .min_epsilon(0.05)
        .target_update_freq(200)
        .seed(2)
        .build()
        .unwrap();

    assert_eq!(agent.epsilon(), 0.3);
    assert_eq!(agent.config().target_update_freq, 200);
    assert_eq!(agent.q_network().action_size(), 3);
}

#[test]
fn test_builder_rejects_invalid_parameters() {
    let result = DqnAgentBuilder::new().gamma(1.5).build();
    assert!(matches!(result, Err(ReasonerError::InvalidParameter { .. })));

    let result = DqnAgentBuilder::new().target_update_freq(0).build();
    assert!(matches!(result, Err(ReasonerError::InvalidParameter { .. })));
}

#[test]
fn test_epsilon_floor_above_start_is_rejected() {
    let result = DqnAgentBuilder::new().epsilon(0.1).min_epsilon(0.5).build();
    match result {
        Err(ReasonerError::InvalidParameter { name, .. }) => assert_eq!(name, "min_epsilon"),
        other => panic!("expected min_epsilon to be rejected, got {:?}", other.err()),
    }

    let result = DqnConfig::from_json_str(r#"{ "epsilon": 0.1, "min_epsilon": 0.5 }"#);
    assert!(matches!(result, Err(ReasonerError::InvalidParameter { .. })));

    // A floor equal to the start keeps epsilon fixed through training
    let mut agent = DqnAgent::new(DqnConfig {
        epsilon: 0.5,
        min_epsilon: 0.5,
        ..small_config()
    })
    .unwrap();
    fill_buffer(&mut agent, 32);
    agent.train().unwrap();
    assert_eq!(agent.epsilon(), 0.5);
}

#[test]
fn test_config_from_json() {
    let config = DqnConfig::from_json_str(r#"{ "epsilon_decay": 0.9, "batch_size": 8 }"#).unwrap();
    assert_eq!(config.epsilon_decay, 0.9);
    assert_eq!(config.batch_size, 8);
    assert_eq!(config.state_size, 128);

    let invalid = DqnConfig::from_json_str(r#"{ "gamma": -0.1 }"#);
    assert!(matches!(invalid, Err(ReasonerError::InvalidParameter { .. })));

    let malformed = DqnConfig::from_json_str("{ not json");
    assert!(matches!(malformed, Err(ReasonerError::Serialization(_))));
}

#[test]
fn test_greedy_action_hand_computed() {
    // Single layer, so the Q-values are relu(W . s)
    let layer = DenseLayer::from_parts(
        arr2(&[[0.1, 0.0], [0.0, 0.5], [0.2, 0.2]]),
        arr1(&[0.0, 0.0, 0.0]),
    )
    .unwrap();
    let q_network = QNetwork::with_layers(vec![layer.clone()]).unwrap();
    let target_network = QNetwork::with_layers(vec![layer]).unwrap();
    let config = DqnConfig {
        state_size: 2,
        action_size: 3,
        ..DqnConfig::default()
    };
    let mut agent = DqnAgent::with_networks(config, q_network, target_network, seeded_rng(3)).unwrap();
    agent.set_epsilon(0.0);

    let state = arr1(&[1.0, 1.0]);
    // Q = [0.1, 0.5, 0.4]
    for _ in 0..10 {
        assert_eq!(agent.select_action(state.view()).unwrap(), 1);
    }
}

#[test]
fn test_argmax_ties_go_to_lowest_index() {
    assert_eq!(argmax(&arr1(&[0.0, 2.0, 2.0, 1.0])).unwrap(), 1);
    assert_eq!(argmax(&arr1(&[3.0, 3.0, 3.0])).unwrap(), 0);
    assert_eq!(argmax(&arr1(&[f32::NAN, 1.0])).unwrap(), 1);
    assert!(argmax(&Array1::zeros(0)).is_err());
}

#[test]
fn test_full_exploration_is_uniform() {
    let config = DqnConfig {
        state_size: 8,
        action_size: 64,
        seed: Some(4),
        ..DqnConfig::default()
    };
    let mut agent = DqnAgent::new(config).unwrap();
    agent.set_epsilon(1.0);

    let state = Array1::zeros(8);
    let trials = 64 * 200;
    let mut counts = vec![0usize; 64];
    for _ in 0..trials {
        let action = agent.select_action(state.view()).unwrap();
        counts[action] += 1;
    }

    // Expected 200 per action, standard deviation about 14
    for (action, &count) in counts.iter().enumerate() {
        assert!((120..=280).contains(&count), "action {} drawn {} times", action, count);
    }
}

#[test]
fn test_select_action_rejects_wrong_state_length() {
    let mut agent = DqnAgent::new(small_config()).unwrap();
    let result = agent.select_action(Array1::zeros(15).view());
    assert!(matches!(result, Err(ReasonerError::InvalidDimension { .. })));
}

#[test]
fn test_remember_validates_transition() {
    let mut agent = DqnAgent::new(small_config()).unwrap();
    let bad_state = Transition {
        state: Array1::zeros(3),
        action: 0,
        reward: 0.0,
        next_state: Array1::zeros(16),
        done: false,
    };
    assert!(agent.remember(bad_state).is_err());

    let bad_action = Transition {
        state: Array1::zeros(16),
        action: 4,
        reward: 0.0,
        next_state: Array1::zeros(16),
        done: false,
    };
    assert!(agent.remember(bad_action).is_err());
    assert!(agent.buffer().is_empty());
}

#[test]
fn test_train_below_batch_size_is_noop() {
    let mut agent = DqnAgent::new(small_config()).unwrap();
    fill_buffer(&mut agent, 31);
    let q_before = agent.q_network().clone();

    assert_eq!(agent.train().unwrap(), None);
    assert_eq!(agent.total_steps(), 0);
    assert_eq!(agent.epsilon(), 1.0);
    assert_eq!(agent.q_network(), &q_before);
}

#[test]
fn test_epsilon_decay_and_target_sync_cadence() {
    let config = DqnConfig {
        epsilon_decay: 0.9,
        target_update_freq: 10,
        ..small_config()
    };
    let mut agent = DqnAgent::new(config).unwrap();
    fill_buffer(&mut agent, 40);

    let mut previous = agent.epsilon();
    for step in 1..=100 {
        let loss = agent.train().unwrap();
        assert!(loss.is_some());
        assert_eq!(agent.total_steps(), step);

        let epsilon = agent.epsilon();
        assert!(epsilon <= previous);
        assert!(epsilon >= 0.01);
        previous = epsilon;

        assert_eq!(agent.target_syncs(), step / 10);
        if step % 10 == 0 {
            assert_eq!(agent.target_network(), agent.q_network());
        }
    }
    // 0.9^100 is far below the floor
    assert_eq!(agent.epsilon(), 0.01);
}

#[test]
fn test_default_decay_schedule() {
    let mut agent = DqnAgent::new(small_config()).unwrap();
    fill_buffer(&mut agent, 32);

    for _ in 0..10 {
        agent.train().unwrap();
    }
    let expected = 0.995f32.powi(10);
    assert!((agent.epsilon() - expected).abs() < 1e-5);
}

#[test]
fn test_update_target_network() {
    let mut agent = DqnAgent::new(small_config()).unwrap();
    assert_ne!(agent.target_network(), agent.q_network());

    agent.update_target_network();
    assert_eq!(agent.target_network(), agent.q_network());
    assert_eq!(agent.target_syncs(), 1);
}

#[test]
fn test_training_reduces_td_error() {
    let constant = |rows: usize, cols: usize| {
        DenseLayer::from_parts(Array2::from_elem((rows, cols), 0.1), Array1::from_elem(rows, 0.1)).unwrap()
    };
    let network = || QNetwork::with_layers(vec![constant(3, 4), constant(3, 3), constant(2, 3)]).unwrap();
    let config = DqnConfig {
        state_size: 4,
        action_size: 2,
        learning_rate: 0.05,
        ..DqnConfig::default()
    };
    let mut agent = DqnAgent::with_networks(config, network(), network(), seeded_rng(5)).unwrap();
    for _ in 0..32 {
        agent
            .remember(Transition {
                state: Array1::from_elem(4, 0.5),
                action: 0,
                reward: 1.0,
                next_state: Array1::from_elem(4, 0.5),
                done: true,
            })
            .unwrap();
    }

    let first_loss = agent.train().unwrap().unwrap();
    let mut last_loss = first_loss;
    for _ in 0..200 {
        last_loss = agent.train().unwrap().unwrap();
    }
    assert!(first_loss > 0.5);
    assert!(last_loss < first_loss * 0.1, "loss went from {} to {}", first_loss, last_loss);
}

#[test]
fn test_confidence_is_finite_for_equal_q_values() {
    let zero_layer = |rows: usize, cols: usize| {
        DenseLayer::from_parts(Array2::zeros((rows, cols)), Array1::zeros(rows)).unwrap()
    };
    let network = || QNetwork::with_layers(vec![zero_layer(4, 4), zero_layer(3, 4)]).unwrap();
    let config = DqnConfig {
        state_size: 4,
        action_size: 3,
        ..DqnConfig::default()
    };
    let agent = DqnAgent::with_networks(config, network(), network(), seeded_rng(6)).unwrap();

    let confidence = agent.get_confidence(Array1::from_elem(4, 0.7).view()).unwrap();
    assert!(confidence.is_finite());
    assert_eq!(confidence, 0.0);
}

#[test]
fn test_confidence_hand_computed() {
    let layer = DenseLayer::from_parts(arr2(&[[1.0, 0.0], [0.0, 1.0]]), arr1(&[0.0, 0.0])).unwrap();
    let config = DqnConfig {
        state_size: 2,
        action_size: 2,
        ..DqnConfig::default()
    };
    let agent = DqnAgent::with_networks(
        config,
        QNetwork::with_layers(vec![layer.clone()]).unwrap(),
        QNetwork::with_layers(vec![layer]).unwrap(),
        seeded_rng(7),
    )
    .unwrap();

    // max 0.8, min 0.2
    let confidence = agent.get_confidence(arr1(&[0.8, 0.2]).view()).unwrap();
    assert!((confidence - 0.8 / 0.6).abs() < 1e-5);
}

#[test]
fn test_seeded_agents_agree() {
    let build = || {
        let mut agent = DqnAgentBuilder::new().seed(99).build().unwrap();
        agent.set_epsilon(0.0);
        agent
    };
    let mut a = build();
    let mut b = build();
    let zero = Array1::zeros(128);

    let action = a.select_action(zero.view()).unwrap();
    assert_eq!(action, b.select_action(zero.view()).unwrap());
    assert_eq!(action, a.select_action(zero.view()).unwrap());
}

#[test]
fn test_with_networks_checks_shapes() {
    let mut rng = seeded_rng(8);
    let q = QNetwork::new(16, 4, &mut rng).unwrap();
    let wrong = QNetwork::new(16, 5, &mut rng).unwrap();
    let result = DqnAgent::with_networks(small_config(), q, wrong, rng);
    assert!(matches!(result, Err(ReasonerError::InvalidDimension { .. })));
}

#[test]
fn test_save_and_load() {
    let mut agent = DqnAgent::new(small_config()).unwrap();
    fill_buffer(&mut agent, 32);
    for _ in 0..3 {
        agent.train().unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.bin");
    agent.save(&path).unwrap();

    let loaded = DqnAgent::load(&path, seeded_rng(9)).unwrap();
    let state = Array1::from_elem(16, 0.3);
    assert_eq!(loaded.total_steps(), 3);
    assert_eq!(loaded.epsilon(), agent.epsilon());
    assert_eq!(loaded.config(), agent.config());
    assert!(loaded.buffer().is_empty());
    assert_eq!(
        loaded.q_network().forward(state.view()).unwrap(),
        agent.q_network().forward(state.view()).unwrap()
    );
    assert_eq!(loaded.target_network(), agent.target_network());
}

fn write_snapshot(path: &std::path::Path, q_layers: Vec<LayerParts>, target_layers: Vec<LayerParts>) {
    let snapshot = AgentSnapshot {
        config: small_config(),
        epsilon: 0.5,
        total_steps: 7,
        target_syncs: 0,
        q_network: NetworkParts { layers: q_layers },
        target_network: NetworkParts { layers: target_layers },
    };
    std::fs::write(path, bincode::serialize(&snapshot).unwrap()).unwrap();
}

#[test]
fn test_load_rejects_malformed_networks() {
    let dir = tempfile::tempdir().unwrap();
    let valid = QNetwork::new(16, 4, &mut seeded_rng(14)).unwrap().layer_parts();

    // Weight matrix and bias vector disagree
    let path = dir.path().join("bad_layer.bin");
    let bad_layer = LayerParts {
        weights: Array2::zeros((2, 3)),
        biases: Array1::zeros(5),
    };
    write_snapshot(&path, vec![bad_layer], valid.clone());
    let result = DqnAgent::load(&path, seeded_rng(15));
    assert!(matches!(result, Err(ReasonerError::InvalidDimension { .. })));

    // No layers at all
    let path = dir.path().join("empty.bin");
    write_snapshot(&path, valid.clone(), Vec::new());
    let result = DqnAgent::load(&path, seeded_rng(15));
    assert!(matches!(result, Err(ReasonerError::InvalidDimension { .. })));

    // Well-formed network that does not match the stored config
    let path = dir.path().join("wrong_size.bin");
    let other = QNetwork::new(16, 5, &mut seeded_rng(16)).unwrap().layer_parts();
    write_snapshot(&path, valid.clone(), other);
    let result = DqnAgent::load(&path, seeded_rng(15));
    assert!(matches!(result, Err(ReasonerError::InvalidDimension { .. })));

    let path = dir.path().join("good.bin");
    write_snapshot(&path, valid.clone(), valid);
    let agent = DqnAgent::load(&path, seeded_rng(15)).unwrap();
    assert_eq!(agent.total_steps(), 7);
    assert_eq!(agent.target_network(), agent.q_network());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = DqnAgent::load(dir.path().join("missing.bin"), seeded_rng(10));
    assert!(matches!(result, Err(ReasonerError::Io(_))));
}
