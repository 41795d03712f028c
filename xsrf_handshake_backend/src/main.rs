#[rocket::launch]
fn rocket() -> _ {
    xsrf_handshake_backend::build_rocket()
}
