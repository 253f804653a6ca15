fn main() {
    corebot_lib::run();
}
