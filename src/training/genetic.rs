use rand::Rng;

use crate::error::{NetworkError, Result};
use crate::network::Network;

const CUT_LENGTH_PERCENTAGE: f64 = 30.0;

/// Combines the weights of two networks into a new offspring network.
///
/// The parents' weights are flattened into DNA strings in canonical order
/// and recombined with a two-point crossover: a contiguous cut covering
/// 30% of the DNA is placed uniformly at random, and the offspring takes
/// the mother's genes strictly inside the cut and the father's everywhere
/// else. The single interval produces longer correlated inherited blocks
/// than a per-gene coin flip would.
///
/// With a `mutation_probability` percent chance the offspring additionally
/// undergoes one transposition mutation - two uniformly chosen genes swap
/// places.
///
/// Fails with [`NetworkError::StructureMismatch`] if the parents' DNA
/// lengths differ. The offspring is a freshly built network with the
/// mother's topology, layer activations included.
pub fn breed(mother: &Network, father: &Network, mutation_probability: f64) -> Result<Network> {
    let mother_dna = mother.flattened_weights();
    let father_dna = father.flattened_weights();

    if mother_dna.len() != father_dna.len() {
        return Err(NetworkError::StructureMismatch {
            mother: mother_dna.len(),
            father: father_dna.len(),
        });
    }

    let mut rng = rand::thread_rng();
    let mut offspring_dna = crossover(&mother_dna, &father_dna, &mut rng);
    if offspring_dna.len() > 1 && rng.gen::<f64>() * 100.0 < mutation_probability {
        swap_mutate(&mut offspring_dna, &mut rng);
    }

    offspring_of(mother, &offspring_dna)
}

/// Two-point crossover: father's genes everywhere, mother's genes strictly
/// between the cut points (both boundary positions stay paternal).
fn crossover(mother_dna: &[f64], father_dna: &[f64], rng: &mut impl Rng) -> Vec<f64> {
    let dna_length = father_dna.len();
    if dna_length == 0 {
        return Vec::new();
    }

    let cut_length = (dna_length as f64 * (CUT_LENGTH_PERCENTAGE / 100.0)) as usize;
    let cut_point1 = rng.gen_range(0..dna_length - cut_length);
    let cut_point2 = cut_point1 + cut_length;

    (0..dna_length)
        .map(|i| {
            let between_cut_points = i > cut_point1 && i < cut_point2;
            if between_cut_points { mother_dna[i] } else { father_dna[i] }
        })
        .collect()
}

/// Transposition mutation: two uniformly chosen genes trade places.
fn swap_mutate(dna: &mut [f64], rng: &mut impl Rng) {
    let a = rng.gen_range(0..dna.len());
    let b = rng.gen_range(0..dna.len());
    dna.swap(a, b);
}

/// Builds a network with the mother's topology and loads the DNA back in
/// canonical weight order.
fn offspring_of(mother: &Network, dna: &[f64]) -> Result<Network> {
    let mut offspring = Network::new();
    for layer in &mother.layers {
        offspring.add_layer(layer.normal_count(), layer.activation)?;
    }
    offspring.build()?;
    offspring.load_weights(dna)?;
    Ok(offspring)
}
