fn main() {
    // Compile the Slint file.
    //
    // The climatewidget.slint file is compiled into a Rust file that contains the UI code.
    slint_build::compile("../ui/climatewidget.slint").expect("Slint build failed");
}
