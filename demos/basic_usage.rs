//! Basic usage of the root-passing engine and the AvlMap wrapper.
//!
//! Run with `RUST_LOG=avl_rs=trace` to see every rotation.

use avl_rs::{AvlMap, Config, NodeArena};
use tracing_subscriber::EnvFilter;

fn main() -> avl_rs::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    example_engine()?;
    example_map()?;
    example_capacity_limit();
    Ok(())
}

fn example_engine() -> avl_rs::Result<()> {
    println!("=== NodeArena (caller holds the root) ===\n");

    let mut arena: NodeArena<&str> = NodeArena::new();
    let mut root = None;
    for (key, name) in [(5, "five"), (3, "three"), (8, "eight"), (1, "one"), (4, "four")] {
        root = Some(arena.insert(root, key, name)?);
    }
    print!("{}", arena.render(root));

    if let Some(id) = arena.search(root, 4) {
        let node = arena.node(id);
        println!("Key {} was found at height {}.", node.key(), node.height());
    }

    root = arena.delete(root, 5);
    println!("\nAfter deleting 5:");
    print!("{}", arena.render(root));

    println!(
        "\n{} live nodes, ~{} bytes of slot storage (initial capacity {})",
        arena.live_nodes(),
        arena.memory_usage(),
        arena.config().initial_capacity
    );

    let released = arena.destroy(root);
    arena.shrink_to_fit();
    println!(
        "Released {} nodes, {} still live, ~{} bytes after shrinking\n",
        released,
        arena.live_nodes(),
        arena.memory_usage()
    );
    Ok(())
}

fn example_map() -> avl_rs::Result<()> {
    println!("=== AvlMap ===\n");

    let mut map = AvlMap::new();
    for key in [30, 10, 20, -5, 40] {
        map.insert(key, key * key)?;
    }
    println!("{:?}", map);
    println!("get(20) = {:?}", map.get(20));
    println!("remove(10) = {:?}", map.remove(10));
    println!("height = {}, len = {}\n", map.height(), map.len());
    Ok(())
}

fn example_capacity_limit() {
    println!("=== Node limit ===\n");

    let mut map = AvlMap::with_config(Config {
        initial_capacity: 2,
        max_nodes: Some(2),
    });
    for key in 1..=3 {
        match map.insert(key, format!("payload-{key}")) {
            Ok(_) => println!("inserted {key}"),
            Err(err) => {
                println!("insert failed: {err}");
                println!("got {:?} back", err.into_value());
            }
        }
    }
}
