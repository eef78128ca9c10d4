/// Credential form served at `/`.
pub const CONFIG_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>ESP32 WiFi Configuration</title>
<style>
body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background: #f0f0f0; }
h1 { color: #333; }
form { background: #fff; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,.1); }
input[type=text], input[type=password] { width: 100%; padding: 10px; margin: 10px 0; border: 1px solid #ddd; border-radius: 4px; box-sizing: border-box; }
input[type=submit] { background: #4caf50; color: #fff; padding: 10px 20px; border: 0; border-radius: 4px; cursor: pointer; }
input[type=submit]:hover { background: #45a049; }
</style>
</head>
<body>
<h1>ESP32 WiFi Configuration</h1>
<form method="post" action="/save">
<input type="text" name="ssid" placeholder="SSID" required><br>
<input type="password" name="password" placeholder="Password" required><br>
<input type="submit" value="Save">
</form>
</body>
</html>
"#;

/// Where unknown paths are redirected.
pub const PORTAL_URL: &str = "http://192.168.4.1/";

pub const CONNECT_FAILED: &str = "Failed to connect with new credentials";
