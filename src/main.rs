#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up logging for development
    env_logger::init();

    // Background image loads run on this runtime
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let floorplan_id = floorplan_editor::seed::floorplan_id_from_args(std::env::args().skip(1));
    floorplan_editor::run_app(floorplan_id)?;
    Ok(())
}

// The browser build starts through the library's wasm entry point
#[cfg(target_arch = "wasm32")]
fn main() {}
