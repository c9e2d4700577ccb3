//! Demo client: opens the data stream for a client id, prints the
//! triples it receives, then submits a result pair over the unary
//! endpoint.
//!
//! The submitted result is a placeholder, standing in for whatever
//! computation a real worker performs on its share of the triples.

use clap::Parser;
use num_bigint::BigUint;
use triplecast_core::codec;
use triplecast_core::proto::{
    ComputationRequest, ComputationResult,
    computation_service_client::ComputationServiceClient,
};

#[derive(Parser, Debug)]
#[command(name = "triplecast-client", version, about = "Demo consumer for the triple stream")]
struct ClientArgs {
    /// Server endpoint.
    #[arg(long, env = "SERVER_ENDPOINT", default_value_t = String::from("http://127.0.0.1:50051"))]
    server_endpoint: String,

    /// Client id to register the stream under.
    #[arg(long, default_value_t = String::from("client1"))]
    client_id: String,

    /// Number of batches to consume before submitting a result.
    #[arg(long, default_value_t = 3)]
    batches: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = ClientArgs::parse();

    let mut client = ComputationServiceClient::connect(args.server_endpoint).await?;

    let mut stream = client
        .initialize_data_stream(ComputationRequest {
            client_id: args.client_id.clone(),
        })
        .await?
        .into_inner();

    let mut received = 0usize;
    while received < args.batches {
        let Some(batch) = stream.message().await? else {
            println!("stream ended by server");
            break;
        };

        for i in 0..batch.scalar.len() {
            let scalar = codec::decode(&batch.scalar[i]);
            let x = codec::decode(&batch.x[i]);
            let y = codec::decode(&batch.y[i]);
            println!("received triple: scalar={scalar} x={x} y={y}");
        }
        received += 1;
    }
    // Close our half so the server sees the disconnect.
    drop(stream);

    let result = ComputationResult {
        result_x: codec::encode(&BigUint::from(1u8))?.to_vec(),
        result_y: codec::encode(&BigUint::from(2u8))?.to_vec(),
    };
    let ack = client.receive_computation_result(result).await?.into_inner();
    println!("result acknowledged: success={}", ack.success);

    Ok(())
}
