//! HTML page with the D3.js bubble chart and cases slider

use crate::report::{Citation, Page};
use std::io::{self, Write};

const D3_URL: &str = "https://d3js.org/d3.v7.min.js";
const FONT_URL: &str = "https://fonts.googleapis.com/css2?family=Roboto+Condensed:wght@300&display=swap";
const STYLESHEET: &str = "styles.css";

pub fn write<W: Write>(writer: &mut W, page: &Page) -> io::Result<()> {
    let json_data = script_json(page)?;
    let summary = &page.summary;

    let og_url = page
        .page_url
        .as_deref()
        .map(|u| format!(r#"<meta property="og:url" content="{}">"#, escape_html(u)))
        .unwrap_or_default();

    write!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">
    <meta property="og:type" content="website">
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    {og_url}
    <meta name="twitter:card" content="summary_large_image">
    <meta name="twitter:title" content="{title}">
    <meta name="twitter:description" content="{description}">
    <link rel="stylesheet" href="{stylesheet}">
    <link href="{font_url}" rel="stylesheet">
    <script src="{d3_url}"></script>
    <style>
        :root {{
            --bg: #2b2b2b;
            --plot: #383838;
            --border: #464646;
            --text: #eeeeee;
            --dim: #a0a0a0;
            --accent: #ffff00;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: 'Roboto Condensed', 'Segoe UI', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
        }}
        .container {{ max-width: 900px; margin: 0 auto; padding: 2rem; }}
        .title {{ font-size: 2.25rem; font-weight: 300; margin-bottom: 1.5rem; }}

        /* Stats Row */
        .stats {{
            display: grid;
            grid-template-columns: repeat(3, 1fr);
            gap: 1rem;
            margin-bottom: 1.5rem;
        }}
        .stat {{
            background: var(--plot);
            border: 1px solid var(--border);
            border-radius: 8px;
            padding: 1rem;
            text-align: center;
        }}
        .stat-value {{ font-size: 2rem; font-weight: 700; line-height: 1; color: var(--accent); }}
        .stat-label {{ color: var(--dim); font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.05em; margin-top: 0.5rem; }}

        #chart svg {{ display: block; }}
        .bubble {{ cursor: pointer; transition: fill-opacity 0.1s; }}
        .label {{ pointer-events: none; }}
        .axis text {{ fill: var(--text); }}
        .axis path, .axis line {{ stroke: var(--text); }}
        .grid line {{ stroke: var(--border); }}
        .grid path {{ display: none; }}

        /* Slider */
        .slider {{ margin-top: 1rem; }}
        .slider-title {{ font-size: 0.9rem; color: var(--dim); }}
        .slider-title span {{ color: var(--text); font-weight: 700; }}
        .slider input {{ width: 100%; accent-color: var(--accent); }}

        /* Tooltip */
        .tooltip {{
            position: absolute;
            background: #383838;
            color: #eeeeee;
            border: 1px solid var(--border);
            border-radius: 6px;
            padding: 0.5rem 0.75rem;
            font-size: 0.85rem;
            pointer-events: none;
            opacity: 0;
            transition: opacity 0.15s;
            z-index: 1000;
        }}
        .tooltip.visible {{ opacity: 1; }}
        .tooltip b {{ color: var(--dim); font-weight: 400; }}

        /* Sources */
        .sources {{ margin-top: 2rem; font-size: 0.8rem; color: var(--dim); }}
        .sources h2 {{ font-size: 0.9rem; font-weight: 700; margin-bottom: 0.5rem; color: var(--text); }}
        .sources li {{ margin-left: 1.25rem; }}
        .sources a {{ color: var(--dim); word-break: break-all; }}

        .footer {{
            margin-top: 2rem;
            padding-top: 1rem;
            border-top: 1px solid var(--border);
            color: var(--dim);
            font-size: 0.8rem;
            text-align: center;
        }}
    </style>
</head>
<body>
    <div class="container">
        <div><p class="title">{title}</p></div>

        <div class="stats">
            <div class="stat">
                <div class="stat-value" id="stat-cases">{live_cases}</div>
                <div class="stat-label">{live_name} cases</div>
            </div>
            <div class="stat">
                <div class="stat-value" id="stat-deaths">{live_deaths}</div>
                <div class="stat-label">{live_name} deaths</div>
            </div>
            <div class="stat">
                <div class="stat-value">{live_mortality}</div>
                <div class="stat-label">Mortality</div>
            </div>
        </div>

        <div id="chart"></div>

        <div class="slider" id="slider" hidden>
            <div class="slider-title"><label for="cases-slider" id="slider-title"></label>: <span id="slider-value"></span></div>
            <input type="range" id="cases-slider">
        </div>

        <div class="sources">
            <h2>Sources</h2>
            <ul>
{citations}
            </ul>
        </div>

        <div class="footer">Generated {generated}</div>
    </div>

    <div class="tooltip" id="tooltip"></div>

    <script>
    const data = {json_data};
    const chart = data.chart;
    const rows = chart.rows;

    const fmtCount = d3.format(',.0f');
    const fmtPct = d3.format('.2%');
    function tickFormat(pattern) {{
        return pattern === '0%' ? d3.format('.0%') : d3.format(',.0f');
    }}

    const margin = {{ top: 20, right: 30, bottom: 60, left: 70 }};
    const width = chart.width - margin.left - margin.right;
    const height = chart.height - margin.top - margin.bottom;

    const svgRoot = d3.select('#chart')
        .append('svg')
        .attr('width', chart.width)
        .attr('height', chart.height)
        .style('background', chart.theme.background);

    const svg = svgRoot.append('g')
        .attr('transform', `translate(${{margin.left}},${{margin.top}})`);

    // Scales: the x domain covers the whole slider range so the live bubble
    // never leaves the plot
    const xMax = Math.max(d3.max(rows, d => d.cases), chart.slider ? chart.slider.end : 0);
    const xMin = Math.max(1, d3.min(rows, d => d.cases));
    const x = (chart.x_axis.scale === 'log' ? d3.scaleLog() : d3.scaleLinear())
        .domain([xMin / 2, xMax * 2])
        .range([0, width]);
    const yMax = Math.max(0.45, d3.max(rows, d => d.mortality) * 1.15);
    const y = d3.scaleLinear()
        .domain([0, yMax])
        .range([height, 0]);

    // Grid
    svg.append('g')
        .attr('class', 'grid')
        .attr('transform', `translate(0,${{height}})`)
        .call(d3.axisBottom(x).ticks(6).tickSize(-height).tickFormat(''));
    svg.append('g')
        .attr('class', 'grid')
        .call(d3.axisLeft(y).ticks(8).tickSize(-width).tickFormat(''));
    svg.selectAll('.grid line').style('stroke', chart.theme.grid);

    // Axes
    svg.append('g')
        .attr('class', 'axis')
        .attr('transform', `translate(0,${{height}})`)
        .call(d3.axisBottom(x).ticks(6, tickFormat(chart.x_axis.format)));
    svg.append('g')
        .attr('class', 'axis')
        .call(d3.axisLeft(y).ticks(8).tickFormat(tickFormat(chart.y_axis.format)));
    svg.selectAll('.axis text').style('fill', chart.theme.text);
    svg.selectAll('.axis path, .axis line').style('stroke', chart.theme.text);

    svg.append('text')
        .attr('x', width / 2)
        .attr('y', height + 45)
        .attr('text-anchor', 'middle')
        .style('fill', chart.theme.text)
        .text(chart.x_axis.title);
    svg.append('text')
        .attr('transform', 'rotate(-90)')
        .attr('x', -height / 2)
        .attr('y', -55)
        .attr('text-anchor', 'middle')
        .style('fill', chart.theme.text)
        .text(chart.y_axis.title);

    // Bubbles
    const bubbles = svg.append('g')
        .selectAll('circle')
        .data(rows)
        .enter()
        .append('circle')
        .attr('class', 'bubble')
        .attr('fill', d => d.color)
        .attr('stroke', d => d.color)
        .attr('fill-opacity', chart.bubbles.alpha)
        .on('mouseover', function(event, d) {{
            d3.select(this).attr('fill-opacity', chart.bubbles.hover_alpha);
            showTooltip(event, d);
        }})
        .on('mousemove', (event, d) => showTooltip(event, d))
        .on('mouseout', function() {{
            d3.select(this).attr('fill-opacity', chart.bubbles.alpha);
            hideTooltip();
        }});

    // Labels
    const labelled = rows.filter(d => d.label);
    const labels = svg.append('g')
        .selectAll('text')
        .data(labelled)
        .enter()
        .append('text')
        .attr('class', 'label')
        .style('fill', chart.theme.text)
        .style('font-size', d => d.label.font_size)
        .style('font-weight', d => d.label.bold ? 'bold' : 'normal')
        .text(d => d.label.text);

    // Fixed annotations
    chart.annotations.forEach(a => {{
        svg.append('text')
            .attr('x', x(a.x) + a.x_offset)
            .attr('y', y(a.y) - a.y_offset)
            .attr('text-anchor', 'end')
            .style('fill', chart.theme.text)
            .style('font-size', a.font_size)
            .style('font-weight', a.bold ? 'bold' : 'normal')
            .text(a.text);
    }});

    // Legend, grouped by disease type
    const legend = svg.append('g')
        .attr('transform', `translate(${{width - 120}},10)`);
    chart.legend.forEach((entry, i) => {{
        const g = legend.append('g').attr('transform', `translate(0,${{i * 20}})`);
        g.append('circle')
            .attr('r', 6)
            .attr('cx', 6)
            .attr('cy', 0)
            .attr('fill', entry.color)
            .attr('fill-opacity', chart.bubbles.alpha)
            .attr('stroke', entry.color);
        g.append('text')
            .attr('x', 18)
            .attr('y', 4)
            .style('fill', chart.theme.text)
            .style('font-size', '0.8rem')
            .text(entry.label);
    }});

    function redraw() {{
        bubbles
            .attr('cx', d => x(d.cases))
            .attr('cy', d => y(d.mortality))
            .attr('r', d => Math.max(d.size, 0) / 2);
        labels
            .attr('x', d => x(d.cases) + d.label.x_offset)
            .attr('y', d => y(d.mortality) - d.label.y_offset);
    }}

    // Slider: recompute the live row only, then redraw
    if (chart.slider) {{
        const s = chart.slider;
        const input = document.getElementById('cases-slider');
        const valueEl = document.getElementById('slider-value');
        document.getElementById('slider').hidden = false;
        document.getElementById('slider-title').textContent = s.title;
        input.min = s.start;
        input.max = s.end;
        input.step = s.step;
        input.value = s.value;
        valueEl.textContent = fmtCount(s.value);

        input.addEventListener('input', () => {{
            const cases = Number(input.value);
            const row = rows[s.row];
            row.cases = cases;
            row.deaths = row.mortality * cases;
            let size = row.deaths / s.deaths_per_size_unit;
            if (s.clamp_size) {{
                size = Math.min(s.max_size, Math.max(s.min_size, size));
            }}
            row.size = size;

            valueEl.textContent = fmtCount(cases);
            document.getElementById('stat-cases').textContent = fmtCount(row.cases);
            document.getElementById('stat-deaths').textContent = fmtCount(row.deaths);
            redraw();
        }});
    }}

    // Tooltip
    function showTooltip(event, d) {{
        const tooltip = document.getElementById('tooltip');
        tooltip.innerHTML = '';
        [
            ['Virus', d.disease],
            ['Type', d.type],
            ['Deaths', fmtCount(d.deaths)],
            ['Cases', fmtCount(d.cases)],
            ['Mortality', fmtPct(d.mortality)]
        ].forEach(([k, v]) => {{
            const p = document.createElement('p');
            const b = document.createElement('b');
            b.textContent = k;
            p.appendChild(b);
            p.appendChild(document.createTextNode(': ' + v));
            tooltip.appendChild(p);
        }});
        tooltip.classList.add('visible');
        tooltip.style.left = (event.pageX + 12) + 'px';
        tooltip.style.top = (event.pageY - 12) + 'px';
    }}

    function hideTooltip() {{
        document.getElementById('tooltip').classList.remove('visible');
    }}

    redraw();
    </script>
</body>
</html>
"#,
        title = escape_html(&page.title),
        description = escape_html(&page.description),
        og_url = og_url,
        stylesheet = STYLESHEET,
        font_url = FONT_URL,
        d3_url = D3_URL,
        live_name = escape_html(&summary.live_name),
        live_cases = group_thousands(summary.live_cases),
        live_deaths = group_thousands(summary.live_deaths),
        live_mortality = format!("{:.2}%", summary.live_mortality * 100.0),
        citations = citation_items(&page.citations),
        generated = escape_html(&page.generated),
        json_data = json_data
    )?;

    Ok(())
}

/// Page data as a JS literal that cannot close the surrounding `<script>`.
fn script_json(page: &Page) -> io::Result<String> {
    let json = serde_json::to_string(page)?;
    Ok(json.replace("</", "<\\/"))
}

fn citation_items(citations: &[Citation]) -> String {
    citations
        .iter()
        .map(|c| {
            let url = escape_html(&c.url);
            format!(
                r#"                <li>{}: <a href="{}" target="_blank" rel="noopener">{}</a></li>"#,
                escape_html(&c.names.join(", ")),
                url,
                url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
