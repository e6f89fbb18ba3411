//! CLI command implementations

pub mod compatible;
pub mod describe;
pub mod locate;
pub mod subset;

use raster_model::SampleModel;

/// Prints the geometry every layout shares.
pub fn print_layout(sm: &dyn SampleModel, verbose: bool) {
    let sizes: Vec<String> = sm.sample_sizes().iter().map(u32::to_string).collect();
    println!("{} sample model", sm.kind());
    println!("  Size:          {}x{}", sm.width(), sm.height());
    println!("  Data type:     {}", sm.data_type());
    println!("  Transfer type: {}", sm.transfer_type());
    println!("  Bands:         {}", sm.num_bands());
    println!("  Sample bits:   {}", sizes.join(", "));
    println!("  Data elements: {} per pixel", sm.num_data_elements());
    println!("  Banks:         {}", sm.num_banks());
    println!("  Bank size:     {} elements", sm.buffer_size());

    if verbose {
        println!("  Layout:        {sm:#?}");
    }
}
