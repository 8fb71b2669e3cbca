#[derive(serde::Serialize)]
struct User {
    name: String,
}

fn main() {
    let user = User { name: "lzc".into() };

    teelog::init_dev("./tmp/dev.log").expect("Unable to create log file");
    teelog::info!("Info test log", user = teelog::any(&user));
    teelog::debug!("Debug test log", user = teelog::any(&user));

    // Only the INFO record reaches ./tmp/prod.log; nothing is printed.
    teelog::init_prod("./tmp/prod.log").expect("Unable to create log file");
    teelog::info!("Info test log", user = teelog::any(&user));
    teelog::debug!("Debug test log", user = teelog::any(&user));
}
