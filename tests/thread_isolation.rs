//! Thread Isolation Tests
//!
//! Engines and parameters are shared read-only across threads; each thread
//! owns its workspace. Concurrent results must equal sequential results:
//! - `std::thread` workers with explicit workspaces
//! - rayon workers using the thread-local workspace
//! - one workspace serving engines of different sizes
//!
//! Run with: cargo test --test thread_isolation

use std::sync::Arc;
use std::thread;

use cdfnet::{Backend, Dataset, DatasetConfig, Engine, ModelParams, NeuralInference, Workspace};
use rayon::prelude::*;

fn setup(inputs: usize) -> (Arc<ModelParams>, Vec<Vec<usize>>) {
    let config = DatasetConfig::builder()
        .embedding_width(8)
        .inner_width(48)
        .output_width(30)
        .cardinalities(vec![24, 3, 13, 200])
        .small_magnitude_probability(0.3)
        .build()
        .unwrap();
    let (params, inputs) = Dataset::generate(&config, inputs).unwrap().into_params().unwrap();
    (Arc::new(params), inputs)
}

fn sequential(engine: &Engine, inputs: &[Vec<usize>]) -> Vec<Vec<f64>> {
    let mut ws = engine.create_workspace();
    inputs
        .iter()
        .map(|input| engine.compute(input, &mut ws).unwrap().to_vec())
        .collect()
}

#[test]
fn test_engines_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine>();
    assert_send_sync::<ModelParams>();
    assert_send_sync::<Workspace>();
}

// =============================================================================
// EXPLICIT WORKSPACES
// =============================================================================

#[test]
fn test_std_threads_match_sequential() {
    let (params, inputs) = setup(64);
    let inputs = Arc::new(inputs);

    for backend in Backend::ALL {
        let engine = Arc::new(Engine::new(backend, Arc::clone(&params)));
        let expected = Arc::new(sequential(&engine, &inputs));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let engine = Arc::clone(&engine);
                let inputs = Arc::clone(&inputs);
                let expected = Arc::clone(&expected);
                thread::spawn(move || {
                    let mut ws = engine.create_workspace();
                    // Each thread walks the pool from a different offset
                    for k in 0..inputs.len() * 4 {
                        let i = (k + t * 7) % inputs.len();
                        let got = engine.compute(&inputs[i], &mut ws).unwrap();
                        assert_eq!(got, expected[i].as_slice(), "thread {} input {}", t, i);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().expect("worker panicked");
        }
        println!("✓ {}: 8 threads agree with sequential results", backend);
    }
}

// =============================================================================
// THREAD-LOCAL WORKSPACES
// =============================================================================

#[test]
fn test_rayon_thread_local_workspace() {
    let (params, inputs) = setup(256);

    for backend in Backend::ALL {
        let engine = Engine::new(backend, Arc::clone(&params));
        let expected = sequential(&engine, &inputs);

        let got: Vec<Vec<f64>> = inputs
            .par_iter()
            .map(|input| {
                engine
                    .compute_with_thread_workspace(input, |cdf| cdf.to_vec())
                    .unwrap()
            })
            .collect();

        assert_eq!(got, expected, "{} differs under rayon", backend);
    }
}

#[test]
fn test_workspace_shared_by_engines_of_different_sizes() {
    let (small, small_inputs) = setup(4);
    let config = DatasetConfig::builder()
        .embedding_width(16)
        .inner_width(96)
        .output_width(70)
        .cardinalities(vec![5, 9])
        .build()
        .unwrap();
    let (large, large_inputs) = Dataset::generate(&config, 4).unwrap().into_params().unwrap();

    let small = Engine::new(Backend::Optimized, small);
    let large = Engine::new(Backend::Optimized, Arc::new(large));
    let expected_small = sequential(&small, &small_inputs);
    let expected_large = sequential(&large, &large_inputs);

    let mut ws = Workspace::new();
    for round in 0..3 {
        for (i, input) in small_inputs.iter().enumerate() {
            assert_eq!(small.compute(input, &mut ws).unwrap(), expected_small[i].as_slice());
        }
        for (i, input) in large_inputs.iter().enumerate() {
            assert_eq!(large.compute(input, &mut ws).unwrap(), expected_large[i].as_slice());
        }
        // Grows for the first small and the first large call, then never again
        assert_eq!(ws.growth_count(), 2, "round {}", round);
    }
}
