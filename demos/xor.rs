use axon_nn::{ActivationFunction, Backpropagation, Network, Trainer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut network = Network::new();
    network.add_layer(2, ActivationFunction::Sigmoid)?; // Input layer
    network.add_layer(2, ActivationFunction::Sigmoid)?; // Hidden layer
    network.add_layer(1, ActivationFunction::Sigmoid)?; // Output layer
    network.build()?;

    let inputs = vec![
        vec![0.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 1.0],
    ];
    let ideals = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];

    let mut trainer = Backpropagation::new(inputs.clone(), ideals, 0.45, 0.9);
    trainer.train(&mut network, 0.0001, 10_000)?;
    println!("{}\n", trainer.summary());

    for input in &inputs {
        let output = network.compute(input)?;
        println!("{},{} = {:.4}", input[0], input[1], output[0]);
    }
    Ok(())
}
