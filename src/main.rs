use winit::error::EventLoopError;

fn main() -> Result<(), EventLoopError> {
    env_logger::init();
    driftfield::window::run()
}
