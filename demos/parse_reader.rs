use std::io::Read;

// Import formpart types.
use formpart::Multipart;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get a reader and the content type from somewhere e.g. server request body.
    let (reader, content_type) = get_reader_from_somewhere();

    // Create a `Multipart` instance from that reader, taking the boundary from the content type.
    let mut multipart = Multipart::from_content_type(reader, content_type)?;

    // Iterate over the parts, use `next_part()` to get the next part.
    while let Some(part) = multipart.next_part()? {
        // Get the field name.
        let name = part.name().map(|name| name.to_owned());
        // Get the part's filename if provided in "Content-Disposition" header.
        let file_name = part.file_name().map(|file_name| file_name.to_owned());

        println!("Name: {:?}, File Name: {:?}", name, file_name);

        // Read the part content as text.
        let content = part.text()?;
        println!("Content: {:?}", content);
    }

    let progress = multipart.stream().progress();
    println!("Read {} bytes, {} parts", progress.bytes_read(), progress.items());

    Ok(())
}

// Get a reader and the content type from somewhere e.g. server request body.
fn get_reader_from_somewhere() -> (impl Read, &'static str) {
    let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    (data.as_bytes(), "multipart/form-data; boundary=X-BOUNDARY")
}
