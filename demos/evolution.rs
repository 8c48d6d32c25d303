//! Breeds a population of networks toward the XOR function: every
//! generation the two lowest-error members parent the next population.

use axon_nn::{breed, ActivationFunction, Network};

const POPULATION: usize = 20;
const GENERATIONS: usize = 500;
const MUTATION_PROBABILITY: f64 = 5.0;

const SAMPLES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([1.0, 0.0], 1.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 1.0], 0.0),
];

fn new_member() -> Result<Network, Box<dyn std::error::Error>> {
    let mut network = Network::new();
    network.add_layer(2, ActivationFunction::Sigmoid)?;
    network.add_layer(3, ActivationFunction::Sigmoid)?;
    network.add_layer(1, ActivationFunction::Sigmoid)?;
    network.build()?;
    network.reset()?;
    Ok(network)
}

fn mean_squared_error(network: &mut Network) -> axon_nn::Result<f64> {
    let mut error = 0.0;
    for (input, ideal) in SAMPLES {
        let output = network.compute(&input)?[0];
        error += (output - ideal) * (output - ideal);
    }
    Ok(error / SAMPLES.len() as f64)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut population = Vec::with_capacity(POPULATION);
    for _ in 0..POPULATION {
        population.push(new_member()?);
    }

    for generation in 0..GENERATIONS {
        let mut scored = Vec::with_capacity(population.len());
        for mut network in population {
            let error = mean_squared_error(&mut network)?;
            scored.push((error, network));
        }
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        if generation % 50 == 0 {
            println!("generation {generation}: best error {:.6}", scored[0].0);
        }

        // Elitism: the two best members survive and parent everyone else.
        let mother = &scored[0].1;
        let father = &scored[1].1;
        let mut next = Vec::with_capacity(POPULATION);
        next.push(mother.clone());
        next.push(father.clone());
        while next.len() < POPULATION {
            next.push(breed(mother, father, MUTATION_PROBABILITY)?);
        }
        population = next;
    }

    let mut best = population.remove(0);
    println!("\nfinal outputs:");
    for (input, _) in SAMPLES {
        println!("{},{} = {:.4}", input[0], input[1], best.compute(&input)?[0]);
    }
    Ok(())
}
