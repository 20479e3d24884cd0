//! Upper-triangular matrix transfer demo.
//!
//! The source rank sends the upper triangle of a square matrix to the
//! destination rank through an indexed layout descriptor; every element of
//! the destination matrix outside the triangle keeps its initial zero.
//! Launch two copies with `tri-exec`, or set TRI_RANK and TRI_CONN_LIST by
//! hand. The reference scenario (4x4, rank 0 to rank 1, tag 10, one
//! transfer) can be overridden through the environment; see
//! `Scenario::from_env`.
use layout::{IndexedLayout, Matrix};

mod config;
use config::Scenario;

fn main() {
    let scenario = Scenario::from_env();
    let ctx = comm::init(comm::GroupConfig::from_env()).expect("failed to join process group");

    // Only the source validates; its abort notice reaches everyone else.
    if ctx.rank() == scenario.source {
        if let Err(err) = scenario.validate(ctx.size()) {
            eprintln!("configuration error: {}", err);
            ctx.abort(1);
        }
    }
    // A rank that cannot complete the initial barrier takes the group down
    // rather than hang or crash on its own.
    if let Err(err) = ctx.barrier() {
        eprintln!("barrier failed: {:?}", err);
        ctx.abort(1);
    }

    let region =
        IndexedLayout::upper_triangular(scenario.dim).expect("failed to build layout descriptor");

    if ctx.rank() == scenario.source {
        let matrix = Matrix::sequential(scenario.dim).expect("failed to allocate matrix");
        println!("Matrix sent by rank {}:", scenario.source);
        print!("{}", matrix);
        if let Err(err) = ctx.send_indexed(matrix.as_slice(), &region, scenario.dest, scenario.tag)
        {
            eprintln!("transfer error: {:?}", err);
            ctx.abort(1);
        }
    } else if ctx.rank() == scenario.dest {
        let mut matrix = Matrix::zeros(scenario.dim).expect("failed to allocate matrix");
        if let Err(err) =
            ctx.recv_indexed(matrix.as_mut_slice(), &region, scenario.source, scenario.tag)
        {
            eprintln!("transfer error: {:?}", err);
            ctx.abort(1);
        }
        println!("Matrix received by rank {}:", scenario.dest);
        print!("{}", matrix);
    }
}
