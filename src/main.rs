use anyhow::Result;
use triangles_core::config::Settings;
use triangles_core::support::app::run_application;
use triangles_core::triangle::Triangle;

fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::load()?;
    let sides = &settings.triangle;
    let triangle = Triangle::solve(sides.opposite, sides.adjacent, sides.hypotenuse)?;
    log::info!("Solved triangle: {}", triangle);

    let app = triangles_core::TriangleApp::new(settings.clone(), triangle);
    run_application(settings, app)?;
    Ok(())
}
