//! Transfer tests running a real group over loopback, one thread per rank.
use comm::{init, Context, Error, GroupConfig};
use layout::{IndexedLayout, Matrix};
use std::net::{SocketAddr, TcpListener};
use std::thread;

/// Reserve `count` loopback addresses by binding ephemeral ports, then
/// release them for the ranks to rebind.
fn group_addrs(count: usize) -> Vec<SocketAddr> {
    let listeners: Vec<TcpListener> = (0..count)
        .map(|_| TcpListener::bind("127.0.0.1:0").unwrap())
        .collect();
    listeners
        .iter()
        .map(|listener| listener.local_addr().unwrap())
        .collect()
}

/// Run a two-rank group, one closure per rank.
fn run_pair<F, G>(rank0: F, rank1: G)
where
    F: FnOnce(Context) + Send + 'static,
    G: FnOnce(Context) + Send + 'static,
{
    let conns = group_addrs(2);
    let conns1 = conns.clone();
    let t0 = thread::spawn(move || {
        rank0(init(GroupConfig { rank: 0, conns }).unwrap());
    });
    let t1 = thread::spawn(move || {
        rank1(init(GroupConfig { rank: 1, conns: conns1 }).unwrap());
    });
    t0.join().unwrap();
    t1.join().unwrap();
}

#[test]
fn upper_triangle_round_trip() {
    run_pair(
        |ctx| {
            let matrix = Matrix::sequential(4).unwrap();
            let region = IndexedLayout::upper_triangular(matrix.dim()).unwrap();
            ctx.barrier().unwrap();
            ctx.send_indexed(matrix.as_slice(), &region, 1, 10).unwrap();
        },
        |ctx| {
            let region = IndexedLayout::upper_triangular(4).unwrap();
            let mut matrix = Matrix::zeros(4).unwrap();
            ctx.barrier().unwrap();
            ctx.recv_indexed(matrix.as_mut_slice(), &region, 0, 10)
                .unwrap();
            for row in 0..4 {
                for col in 0..4 {
                    let expected = if col >= row { (row * 4 + col) as i32 } else { 0 };
                    assert_eq!(matrix.get(row, col), expected);
                }
            }
        },
    );
}

#[test]
fn single_element_transfer() {
    run_pair(
        |ctx| {
            let region = IndexedLayout::upper_triangular(1).unwrap();
            ctx.send_indexed(&[7], &region, 1, 10).unwrap();
        },
        |ctx| {
            let region = IndexedLayout::upper_triangular(1).unwrap();
            let mut buf = [0];
            ctx.recv_indexed(&mut buf, &region, 0, 10).unwrap();
            assert_eq!(buf, [7]);
        },
    );
}

#[test]
fn descriptor_reuse_is_independent() {
    run_pair(
        |ctx| {
            let region = IndexedLayout::upper_triangular(3).unwrap();
            let first = Matrix::sequential(3).unwrap();
            let second: Vec<i32> = (0..9).map(|i| 100 + i).collect();
            ctx.send_indexed(first.as_slice(), &region, 1, 20).unwrap();
            ctx.send_indexed(&second, &region, 1, 21).unwrap();
        },
        |ctx| {
            let region = IndexedLayout::upper_triangular(3).unwrap();
            let mut first = Matrix::zeros(3).unwrap();
            let mut second = Matrix::zeros(3).unwrap();
            ctx.recv_indexed(first.as_mut_slice(), &region, 0, 20)
                .unwrap();
            ctx.recv_indexed(second.as_mut_slice(), &region, 0, 21)
                .unwrap();
            assert_eq!(first.as_slice(), &[0, 1, 2, 0, 4, 5, 0, 0, 8]);
            assert_eq!(second.as_slice(), &[100, 101, 102, 0, 104, 105, 0, 0, 108]);
        },
    );
}

#[test]
fn tag_mismatch_is_fatal() {
    run_pair(
        |ctx| {
            let region = IndexedLayout::upper_triangular(2).unwrap();
            ctx.send_indexed(&[1, 2, 3, 4], &region, 1, 10).unwrap();
        },
        |ctx| {
            let region = IndexedLayout::upper_triangular(2).unwrap();
            let mut buf = [0; 4];
            let err = ctx
                .recv_indexed(&mut buf, &region, 0, 11)
                .unwrap_err();
            assert!(matches!(
                err,
                Error::MessageTagMismatch {
                    expected: 11,
                    actual: 10,
                }
            ));
            // Nothing may have been scattered.
            assert_eq!(buf, [0; 4]);
        },
    );
}

#[test]
fn invalid_peers_rejected() {
    run_pair(
        |ctx| {
            let region = IndexedLayout::upper_triangular(2).unwrap();
            let buf = [0; 4];
            assert!(matches!(
                ctx.send_indexed(&buf, &region, 5, 10),
                Err(Error::InvalidRank(5))
            ));
            assert!(matches!(
                ctx.send_indexed(&buf, &region, 0, 10),
                Err(Error::SelfMessage)
            ));
        },
        |_ctx| {},
    );
}

#[test]
fn lone_member_cannot_transfer() {
    let conns = group_addrs(1);
    let ctx = init(GroupConfig { rank: 0, conns }).unwrap();
    assert_eq!(ctx.size(), 1);
    let region = IndexedLayout::upper_triangular(2).unwrap();
    let buf = [0; 4];
    assert!(matches!(
        ctx.send_indexed(&buf, &region, 1, 10),
        Err(Error::GroupTooSmall)
    ));
    // Barrier over a single member is a no-op.
    ctx.barrier().unwrap();
}

#[test]
fn bad_rank_in_config_rejected() {
    let conns = group_addrs(1);
    assert!(matches!(
        init(GroupConfig { rank: 3, conns }),
        Err(Error::InvalidRank(3))
    ));
}
